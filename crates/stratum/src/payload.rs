use super::*;

/// Raw share submission: the hex-encoded header data a miner hands
/// back. Fields live at fixed character offsets; everything past the
/// header prefix is nonce space the server treats as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct SharePayload(String);

const VERSION_RANGE: std::ops::Range<usize> = 0..8;
const MERKLE_ROOT_RANGE: std::ops::Range<usize> = 72..136;
const NTIME_RANGE: std::ops::Range<usize> = 136..144;

/// Hex length of the hashed header prefix (84 bytes).
pub const HEADER_HEX_LEN: usize = 168;

impl SharePayload {
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() < HEADER_HEX_LEN {
            return Err(WireError::Truncated {
                len: s.len(),
                min: HEADER_HEX_LEN,
            });
        }

        if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(WireError::Hex {
                message: format!("share payload is not valid hex ({} chars)", s.len()),
            });
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn version_hex(&self) -> &str {
        &self.0[VERSION_RANGE]
    }

    pub fn merkle_root_hex(&self) -> &str {
        &self.0[MERKLE_ROOT_RANGE]
    }

    pub fn ntime(&self) -> Result<Ntime> {
        Ntime::from_flipped_hex(&self.0[NTIME_RANGE])
    }

    /// The 84 header bytes that get double-hashed into the block hash.
    pub fn header_bytes(&self) -> Vec<u8> {
        hex::decode(&self.0[..HEADER_HEX_LEN]).expect("validated on construction")
    }
}

impl Display for SharePayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SharePayload {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
