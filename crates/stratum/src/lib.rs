use {
    byteorder::{ByteOrder, LittleEndian},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::Snafu,
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

pub use {
    difficulty::{BASE_TARGET_BITS, LOG_STEP, base_target, ratio_to_f64, target_from_basediff},
    error::{Result, WireError},
    extranonce::Extranonce,
    job_id::JobId,
    nbits::Nbits,
    ntime::Ntime,
    payload::SharePayload,
    prevhash::PrevHash,
};

mod difficulty;
mod error;
mod extranonce;
mod job_id;
mod nbits;
mod ntime;
mod payload;
mod prevhash;
