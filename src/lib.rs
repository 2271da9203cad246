use {
    anyhow::{Error, ensure},
    async_trait::async_trait,
    bitcoin::{
        VarInt,
        consensus::encode::serialize as consensus_serialize,
        hashes::{Hash, sha256d},
        script::write_scriptint,
    },
    block_template::{BlockTemplate, Broadcast},
    byteorder::{BigEndian, ByteOrder},
    clock::Timestamper,
    coinbase::{CoinbaseBuilder, CoinbaseTemplate, Coinbaser, ScriptCoinbaser},
    daemon::{DaemonRpc, RawBlockTemplate},
    dashmap::DashMap,
    extranonces::ExtranonceCounter,
    merkle_tree::MerkleTree,
    parking_lot::Mutex,
    primitive_types::U256,
    registry::TemplateRegistry,
    serde::{Deserialize, Serialize},
    settings::Settings,
    snafu::Snafu,
    std::{
        collections::{HashMap, HashSet},
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::{SystemTime, UNIX_EPOCH},
    },
    stratum::{Extranonce, JobId, Nbits, Ntime, PrevHash, SharePayload},
    tracing::{debug, error, info, warn},
};

pub mod block_template;
pub mod clock;
pub mod coinbase;
pub mod daemon;
pub mod extranonces;
pub mod logs;
pub mod merkle_tree;
pub mod registry;
pub mod settings;
pub mod shares;
pub mod vardiff;
pub mod worklog;

/// Total extranonce width in the coinbase scriptSig: extranonce1 plus
/// extranonce2.
pub const EXTRANONCE_SIZE: usize = 8;

/// Max ntime forward roll in seconds. Shares with an ntime further
/// into the future than this are rejected.
pub const MAX_NTIME_OFFSET: u64 = 7200;

/// Job id counter wraps below this value; ids only need to be unique
/// among live templates since clean_jobs flushes client state.
pub const JOB_ID_MODULUS: u64 = 0xffff;

type Result<T = (), E = Error> = std::result::Result<T, E>;
