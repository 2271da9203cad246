use super::*;

/// Client-visible handle for a block template. Only unique among
/// currently live templates; clients drop stale ids on clean_jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
#[repr(transparent)]
pub struct JobId(u64);

impl JobId {
    pub fn new(n: u64) -> Self {
        Self(n)
    }
}

impl FromStr for JobId {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        let id = u64::from_str_radix(s, 16).map_err(|e| WireError::Parse {
            message: format!("invalid job id '{s}': {e}"),
        })?;
        Ok(JobId(id))
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> JobId {
        JobId(id)
    }
}

impl From<JobId> for u64 {
    fn from(id: JobId) -> u64 {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        assert_eq!(JobId::from(0x1fu64).to_string(), "1f");
        assert_eq!("1F".parse::<JobId>().unwrap(), JobId::from(0x1f));
        assert_eq!(
            "ffffffffffffffff".parse::<JobId>().unwrap(),
            JobId::from(u64::MAX)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<JobId>().is_err());
        assert!("0x1".parse::<JobId>().is_err());
        assert!("g".parse::<JobId>().is_err());
        assert!("10000000000000000".parse::<JobId>().is_err());
    }

    #[test]
    fn serde_json_as_hex_string() {
        let id = JobId::from(0xbeefu64);
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"beef\"");
        assert_eq!(serde_json::from_str::<JobId>(&s).unwrap(), id);
    }
}
