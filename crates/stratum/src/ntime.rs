use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub struct Ntime(u32);

impl Ntime {
    /// Parses the byte-flipped form miners put in share payloads:
    /// 8 hex chars of the timestamp's little-endian bytes.
    pub fn from_flipped_hex(s: &str) -> Result<Self> {
        let bytes = <[u8; 4]>::try_from(hex::decode(s)?.as_slice()).map_err(|_| {
            WireError::Parse {
                message: format!("ntime field '{s}' is not 4 bytes"),
            }
        })?;
        Ok(Ntime(LittleEndian::read_u32(&bytes)))
    }

    /// Broadcast form: 4 bytes, little endian, hex encoded.
    pub fn to_le_hex(self) -> String {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, self.0);
        hex::encode(buf)
    }
}

impl FromStr for Ntime {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        let time = u32::from_str_radix(s, 16).map_err(|e| WireError::Parse {
            message: format!("invalid ntime '{s}': {e}"),
        })?;
        Ok(Ntime(time))
    }
}

impl Display for Ntime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for Ntime {
    fn from(n: u32) -> Ntime {
        Ntime(n)
    }
}

impl From<Ntime> for u32 {
    fn from(n: Ntime) -> u32 {
        n.0
    }
}
