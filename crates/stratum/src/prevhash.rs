use super::*;

/// Previous block hash. Stored in daemon display order (big endian);
/// work broadcasts and header payloads carry the byte-reversed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash([u8; 32]);

impl PrevHash {
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    pub fn reversed_bytes(self) -> [u8; 32] {
        let mut out = self.0;
        out.reverse();
        out
    }

    pub fn reversed_hex(self) -> String {
        hex::encode(self.reversed_bytes())
    }
}

impl FromStr for PrevHash {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes =
            <[u8; 32]>::try_from(hex::decode(s)?.as_slice()).map_err(|_| WireError::Parse {
                message: format!("prevhash '{s}' is not 32 bytes"),
            })?;
        Ok(PrevHash(bytes))
    }
}

impl Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for PrevHash {
    fn from(bytes: [u8; 32]) -> Self {
        PrevHash(bytes)
    }
}
