use super::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Distinguishes extranonce spaces of concurrently running server
    /// processes. Must fit in 5 bits.
    pub instance_id: u8,
    /// Starting per-worker difficulty, in base-unit multiples.
    pub pool_target: f64,
    /// Accounting multiplier applied to shares at the pool target;
    /// reporting only.
    pub pool_share_base: f64,
    pub vardiff_min_target: f64,
    pub vardiff_max_target: f64,
    /// Desired seconds between shares from one worker.
    pub vardiff_target_time: u64,
    /// Seconds between retarget checks.
    pub vardiff_retarget_time: u64,
    /// Allowed deviation of the average share interval, in percent of
    /// the target, before a retarget triggers.
    pub vardiff_variance_percent: u64,
    /// Idle seconds after which a worker's vardiff state is discarded
    /// and it is treated as new.
    pub worker_cache_time: u64,
    /// Extra bytes embedded in the coinbase scriptSig after the
    /// extranonce slot.
    pub coinbase_extras: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instance_id: 0,
            pool_target: 15.772588724,
            pool_share_base: 1.0,
            vardiff_min_target: 15.079441543,
            vardiff_max_target: 20.624618991,
            vardiff_target_time: 30,
            vardiff_retarget_time: 90,
            vardiff_variance_percent: 30,
            worker_cache_time: 600,
            coinbase_extras: "/remora/".into(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result {
        ensure!(
            self.instance_id <= extranonces::MAX_INSTANCE_ID,
            "instance_id {} exceeds maximum {}",
            self.instance_id,
            extranonces::MAX_INSTANCE_ID
        );

        ensure!(
            self.vardiff_target_time > 0,
            "vardiff_target_time must be positive"
        );

        ensure!(
            self.vardiff_retarget_time >= self.vardiff_target_time,
            "vardiff_retarget_time {} below vardiff_target_time {}",
            self.vardiff_retarget_time,
            self.vardiff_target_time
        );

        ensure!(
            self.vardiff_min_target > 0.0,
            "vardiff_min_target {} must be positive",
            self.vardiff_min_target
        );

        ensure!(
            self.vardiff_min_target <= self.vardiff_max_target,
            "vardiff_min_target {} above vardiff_max_target {}",
            self.vardiff_min_target,
            self.vardiff_max_target
        );

        ensure!(
            self.pool_target >= self.vardiff_min_target && self.pool_target <= self.vardiff_max_target,
            "pool_target {} outside vardiff band [{}, {}]",
            self.pool_target,
            self.vardiff_min_target,
            self.vardiff_max_target
        );

        Ok(())
    }
}
