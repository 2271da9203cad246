use super::*;

/// Share rejection reasons, with the display text sent back to miners.
#[derive(Debug, Snafu, PartialEq)]
pub enum SubmitError {
    #[snafu(display("Job '{job_id}' not found"))]
    JobNotFound { job_id: JobId },
    #[snafu(display("Ntime out of range"))]
    NtimeOutOfRange,
    #[snafu(display("Duplicate share"))]
    DuplicateShare,
    #[snafu(display("Share less than target"))]
    ShareBelowTarget,
    #[snafu(display("Worker is not authorized"))]
    WorkerNotAuthorized,
    #[snafu(display("Connection is not subscribed for mining"))]
    NotSubscribed,
    #[snafu(display("Malformed share: {message}"))]
    Malformed { message: String },
}

/// Scores a share payload. Proof-of-work evaluation lives behind this
/// seam because it is chain specific; higher scores are better and a
/// score at or above the network target solves a block.
pub trait DifficultyScorer: Send + Sync + 'static {
    fn score(&self, payload: &SharePayload) -> U256;
}

/// Mining state of one connection, owned by the transport.
#[derive(Debug, Default)]
pub struct Session {
    pub extranonce1: Option<Extranonce>,
    pub authorized: HashSet<String>,
    /// Integer share target the worker currently mines against.
    pub target: U256,
    /// Same target in base-unit multiples, for reporting.
    pub basediff: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockSubmission {
    pub block_hash: String,
    pub accepted: bool,
}

/// Result of an accepted share.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareOutcome {
    /// Header hash in display order.
    pub block_hash: String,
    /// Scored difficulty in base-unit multiples. Reporting only.
    pub share_difficulty: f64,
    /// Present when the share solved a block.
    pub block: Option<BlockSubmission>,
}

pub struct ShareValidator {
    registry: Arc<TemplateRegistry>,
    scorer: Arc<dyn DifficultyScorer>,
    daemon: Arc<dyn DaemonRpc>,
    clock: Arc<dyn Timestamper>,
}

impl ShareValidator {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        scorer: Arc<dyn DifficultyScorer>,
        daemon: Arc<dyn DaemonRpc>,
        clock: Arc<dyn Timestamper>,
    ) -> Self {
        Self {
            registry,
            scorer,
            daemon,
            clock,
        }
    }

    /// Validates one submitted share. Checks run cheapest first and
    /// every rejection maps to a [`SubmitError`]; daemon trouble while
    /// submitting a solved block never rejects the share itself.
    pub async fn submit(
        &self,
        session: &Session,
        worker: &str,
        job_id: JobId,
        payload: &str,
    ) -> Result<ShareOutcome, SubmitError> {
        if !session.authorized.contains(worker) {
            return Err(SubmitError::WorkerNotAuthorized);
        }

        let Some(extranonce1) = &session.extranonce1 else {
            return Err(SubmitError::NotSubscribed);
        };

        let payload = SharePayload::from_hex(payload).map_err(|err| SubmitError::Malformed {
            message: err.to_string(),
        })?;

        let job = self
            .registry
            .get_job(job_id)
            .ok_or(SubmitError::JobNotFound { job_id })?;

        let ntime = payload.ntime().map_err(|err| SubmitError::Malformed {
            message: err.to_string(),
        })?;

        if !job.check_ntime(ntime, self.clock.now()) {
            return Err(SubmitError::NtimeOutOfRange);
        }

        if !job.register_submit(payload.as_str()) {
            info!(
                worker,
                extranonce1 = %extranonce1,
                payload = payload.as_str(),
                "duplicate share",
            );
            return Err(SubmitError::DuplicateShare);
        }

        let score = self.scorer.score(&payload);
        let block_hash = block_hash_hex(&payload);

        if score < session.target {
            return Err(SubmitError::ShareBelowTarget);
        }

        let share_difficulty = stratum::ratio_to_f64(score);

        let block = if score >= job.network_target {
            info!(%block_hash, "block candidate");
            Some(self.submit_block(&job, extranonce1, &payload, &block_hash).await)
        } else {
            None
        };

        Ok(ShareOutcome {
            block_hash,
            share_difficulty,
            block,
        })
    }

    async fn submit_block(
        &self,
        job: &BlockTemplate,
        extranonce1: &Extranonce,
        payload: &SharePayload,
        block_hash: &str,
    ) -> BlockSubmission {
        let accepted = match job
            .serialize_transactions(extranonce1)
            .map(hex::encode)
        {
            Ok(transactions) => {
                match self
                    .daemon
                    .submit_block(payload.as_str(), &transactions, block_hash)
                    .await
                {
                    Ok(accepted) => {
                        if accepted {
                            info!(block_hash, height = job.height, "block accepted");
                        } else {
                            warn!(block_hash, "node rejected block");
                        }
                        accepted
                    }
                    Err(err) => {
                        error!("submitblock failed: {err}");
                        false
                    }
                }
            }
            Err(err) => {
                error!("failed to serialize block candidate: {err}");
                false
            }
        };

        if accepted {
            self.registry.update_block().await;
        }

        BlockSubmission {
            block_hash: block_hash.into(),
            accepted,
        }
    }
}

/// Header hash of a share in display order.
fn block_hash_hex(payload: &SharePayload) -> String {
    let mut hash = sha256d::Hash::hash(&payload.header_bytes()).to_byte_array();
    hash.reverse();
    hex::encode(hash)
}
