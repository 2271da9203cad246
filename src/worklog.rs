use super::*;

/// Work handed to one session, remembered so the eventual share is
/// credited at the difficulty it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredWork {
    pub job_id: JobId,
    pub target: U256,
    pub basediff: f64,
    pub issued_at: u64,
}

/// Maps `(extranonce1, merkle root)` to issued work. The indirection
/// lets a worker submit against work issued before the current
/// template, as long as the job itself is still live in the registry.
#[derive(Debug, Default)]
pub struct WorkLog {
    entries: DashMap<(Extranonce, String), RegisteredWork>,
}

impl WorkLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, extranonce1: Extranonce, merkle_root: String, work: RegisteredWork) {
        self.entries.insert((extranonce1, merkle_root), work);
    }

    pub fn lookup(&self, extranonce1: &Extranonce, merkle_root: &str) -> Option<RegisteredWork> {
        self.entries
            .get(&(extranonce1.clone(), merkle_root.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Consumes the record once its share has been accounted.
    pub fn take(&self, extranonce1: &Extranonce, merkle_root: &str) -> Option<RegisteredWork> {
        self.entries
            .remove(&(extranonce1.clone(), merkle_root.to_string()))
            .map(|(_, work)| work)
    }

    /// Drops everything issued to one session.
    pub fn clear_session(&self, extranonce1: &Extranonce) {
        self.entries.retain(|(owner, _), _| owner != extranonce1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
