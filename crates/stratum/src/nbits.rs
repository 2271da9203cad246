use super::*;

/// Compact network-target encoding. This chain packs it as a full
/// little-endian u64 in work broadcasts, not Bitcoin's 4-byte form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Nbits(u64);

impl Nbits {
    pub fn value(self) -> u64 {
        self.0
    }

    /// Broadcast form: 8 bytes, little endian, hex encoded.
    pub fn to_le_hex(self) -> String {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, self.0);
        hex::encode(buf)
    }
}

impl FromStr for Nbits {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        let bits = u64::from_str_radix(s, 16).map_err(|e| WireError::Parse {
            message: format!("invalid nbits '{s}': {e}"),
        })?;
        Ok(Nbits(bits))
    }
}

impl Display for Nbits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Nbits {
    fn from(bits: u64) -> Nbits {
        Nbits(bits)
    }
}
