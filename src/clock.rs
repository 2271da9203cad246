use super::*;

/// Injectable clock so template construction and share checks are
/// deterministic under test.
pub trait Timestamper: Send + Sync + 'static {
    /// Seconds since the unix epoch.
    fn now(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimestamper;

impl Timestamper for SystemTimestamper {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
