use {super::*, dashmap::mapref::entry::Entry};

/// External worker store; retargets are persisted here so a worker
/// reconnects at its last difficulty instead of the pool default.
pub trait WorkerIdentity: Send + Sync + 'static {
    fn update_worker_diff(&self, worker: &str, basediff: f64);
}

/// Difficulty change for one worker, to be pushed to its session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retarget {
    pub basediff: f64,
    pub target: U256,
}

/// Fixed-capacity ring of inter-share intervals in seconds.
#[derive(Debug)]
struct IntervalBuffer {
    data: Vec<u64>,
    cursor: usize,
    filled: bool,
}

impl IntervalBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            cursor: 0,
            filled: false,
        }
    }

    fn append(&mut self, interval: u64) {
        self.data[self.cursor] = interval;
        self.cursor += 1;

        if self.cursor == self.data.len() {
            self.cursor = 0;
            self.filled = true;
        }
    }

    fn len(&self) -> usize {
        if self.filled { self.data.len() } else { self.cursor }
    }

    fn average(&self) -> f64 {
        match self.len() {
            0 => 0.0,
            len => self.data[..len].iter().sum::<u64>() as f64 / len as f64,
        }
    }

    fn clear(&mut self) {
        self.cursor = 0;
        self.filled = false;
    }
}

#[derive(Debug)]
struct WorkerState {
    last_retarget: u64,
    last_share: u64,
    buffer: IntervalBuffer,
}

impl WorkerState {
    fn new(now: u64, retarget_time: u64, buffer_size: usize) -> Self {
        Self {
            // start halfway into the retarget window so a brand new
            // worker gets its first adjustment early
            last_retarget: now.saturating_sub(retarget_time / 2),
            last_share: now,
            buffer: IntervalBuffer::new(buffer_size),
        }
    }
}

/// Retunes per-worker difficulty to hold share arrival near the
/// configured target interval.
pub struct VardiffController {
    identity: Arc<dyn WorkerIdentity>,
    workers: DashMap<String, WorkerState>,
    pool_target: f64,
    pool_share_base: f64,
    min_target: f64,
    max_target: f64,
    retarget_time: u64,
    cache_time: u64,
    time_min: f64,
    time_max: f64,
    buffer_size: usize,
}

impl VardiffController {
    pub fn new(settings: &Settings, identity: Arc<dyn WorkerIdentity>) -> Result<Self> {
        settings.validate()?;

        let target_time = settings.vardiff_target_time as f64;
        let variance = target_time * settings.vardiff_variance_percent as f64 / 100.0;

        Ok(Self {
            identity,
            workers: DashMap::new(),
            pool_target: settings.pool_target,
            pool_share_base: settings.pool_share_base,
            min_target: settings.vardiff_min_target,
            max_target: settings.vardiff_max_target,
            retarget_time: settings.vardiff_retarget_time,
            cache_time: settings.worker_cache_time,
            time_min: target_time - variance,
            time_max: target_time + variance,
            buffer_size: usize::max(
                1,
                (settings.vardiff_retarget_time / settings.vardiff_target_time) as usize * 4,
            ),
        })
    }

    /// Records one share arrival for `worker` and decides whether its
    /// difficulty should move. Per-worker state is locked through the
    /// map entry, so calls for the same worker serialize while
    /// different workers proceed independently.
    pub fn submit(&self, worker: &str, current_basediff: f64, now: u64) -> Option<Retarget> {
        let mut entry = match self.workers.entry(worker.to_string()) {
            Entry::Occupied(occupied) => occupied,
            Entry::Vacant(vacant) => {
                vacant.insert(WorkerState::new(now, self.retarget_time, self.buffer_size));
                debug!(worker, "tracking new worker at pool target");
                self.identity.update_worker_diff(worker, self.pool_target);
                return None;
            }
        };

        let state = entry.get_mut();

        if now.saturating_sub(state.last_share) > self.cache_time {
            *state = WorkerState::new(now, self.retarget_time, self.buffer_size);
            debug!(worker, "idle worker reset to pool target");
            self.identity.update_worker_diff(worker, self.pool_target);
            return None;
        }

        state.buffer.append(now.saturating_sub(state.last_share));
        state.last_share = now;

        if now.saturating_sub(state.last_retarget) < self.retarget_time {
            return None;
        }

        state.last_retarget = now;

        let mut avg = state.buffer.average();
        if avg < 1.0 {
            warn!(worker, "share interval average below one second");
            avg = 1.0;
        }

        let new_basediff = if avg > self.time_max && current_basediff > self.min_target {
            (current_basediff - stratum::LOG_STEP).max(self.min_target)
        } else if avg < self.time_min {
            (current_basediff + stratum::LOG_STEP).min(self.max_target)
        } else {
            return None;
        };

        if new_basediff == current_basediff {
            return None;
        }

        state.buffer.clear();
        self.identity.update_worker_diff(worker, new_basediff);

        info!(
            worker,
            average = avg,
            from = current_basediff,
            to = new_basediff,
            "retargeting worker",
        );

        Some(Retarget {
            basediff: new_basediff,
            target: stratum::target_from_basediff(new_basediff),
        })
    }

    /// Accounting weight of a share mined at `basediff`, relative to
    /// the pool target. Reporting only.
    pub fn pool_share(&self, basediff: f64) -> f64 {
        (2f64.powf((basediff - self.pool_target) / stratum::LOG_STEP) * self.pool_share_base)
            .round()
    }

    /// Drops a worker's state, e.g. when its last connection closes.
    pub fn forget(&self, worker: &str) {
        self.workers.remove(worker);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[derive(Default)]
    struct RecordingIdentity {
        updates: Mutex<Vec<(String, f64)>>,
    }

    impl WorkerIdentity for RecordingIdentity {
        fn update_worker_diff(&self, worker: &str, basediff: f64) {
            self.updates.lock().push((worker.to_string(), basediff));
        }
    }

    fn wide_band_settings() -> Settings {
        Settings {
            vardiff_min_target: 10.0,
            vardiff_max_target: 25.0,
            ..Default::default()
        }
    }

    fn controller(settings: Settings) -> (VardiffController, Arc<RecordingIdentity>) {
        let identity = Arc::new(RecordingIdentity::default());
        (
            VardiffController::new(&settings, identity.clone()).unwrap(),
            identity,
        )
    }

    #[test]
    fn rejects_zero_floor_settings() {
        // slow workers ratchet down to the floor, which must stay a
        // usable share target
        let settings = Settings {
            vardiff_min_target: 0.0,
            ..Default::default()
        };

        assert!(VardiffController::new(&settings, Arc::new(RecordingIdentity::default())).is_err());
    }

    #[test]
    fn buffer_ring_semantics() {
        let mut buffer = IntervalBuffer::new(3);
        assert_eq!(buffer.average(), 0.0);

        buffer.append(10);
        buffer.append(20);
        assert!(!buffer.filled);
        assert_eq!(buffer.average(), 15.0);

        buffer.append(30);
        assert!(buffer.filled);
        assert_eq!(buffer.average(), 20.0);

        // wraps over the oldest slot but stays full
        buffer.append(40);
        assert!(buffer.filled);
        assert_eq!(buffer.average(), 30.0);

        buffer.clear();
        assert_eq!(buffer.average(), 0.0);
        assert!(!buffer.filled);
    }

    #[test]
    fn first_share_initializes_at_pool_target() {
        let (vardiff, identity) = controller(Settings::default());

        assert_eq!(vardiff.submit("w", 15.772588724, 1000), None);
        assert_eq!(
            *identity.updates.lock(),
            [("w".to_string(), 15.772588724)],
        );
    }

    #[test]
    fn idle_worker_is_reset() {
        let (vardiff, identity) = controller(Settings::default());

        vardiff.submit("w", 15.772588724, 1000);
        // silent longer than the 600s cache window
        assert_eq!(vardiff.submit("w", 15.772588724, 1700), None);

        assert_eq!(identity.updates.lock().len(), 2);
    }

    #[test]
    fn debounces_within_retarget_window() {
        let (vardiff, _) = controller(wide_band_settings());

        vardiff.submit("w", 15.0, 1000);
        assert_eq!(vardiff.submit("w", 15.0, 1030), None);
        assert_eq!(vardiff.submit("w", 15.0, 1044), None);
    }

    #[test]
    fn in_band_interval_leaves_difficulty_alone() {
        let (vardiff, _) = controller(wide_band_settings());

        vardiff.submit("w", 15.0, 1000);
        // 30s matches the target interval exactly
        assert_eq!(vardiff.submit("w", 15.0, 1030), None);
        assert_eq!(vardiff.submit("w", 15.0, 1060), None);
        assert_eq!(vardiff.submit("w", 15.0, 1090), None);
    }

    #[test]
    fn slow_worker_steps_down_to_floor() {
        let (vardiff, _) = controller(wide_band_settings());

        let mut current = 15.772588724;
        let mut now = 1000;
        vardiff.submit("w", current, now);

        let mut retargets = 0;
        for _ in 0..40 {
            now += 60;
            if let Some(retarget) = vardiff.submit("w", current, now) {
                assert!(retarget.basediff < current);
                assert_eq!(retarget.target, stratum::target_from_basediff(retarget.basediff));
                current = retarget.basediff;
                retargets += 1;
            }
        }

        assert!(retargets > 3);
        assert_eq!(current, 10.0);

        // pinned at the floor now
        now += 60;
        assert_eq!(vardiff.submit("w", current, now), None);
    }

    #[test]
    fn fast_worker_steps_up_to_ceiling() {
        let (vardiff, _) = controller(wide_band_settings());

        let mut current = 15.772588724;
        let mut now = 1000;
        vardiff.submit("w", current, now);

        for _ in 0..120 {
            now += 15;
            if let Some(retarget) = vardiff.submit("w", current, now) {
                assert!(retarget.basediff > current);
                current = retarget.basediff;
            }
        }

        assert_eq!(current, 25.0);
    }

    #[test]
    fn burst_intervals_floor_at_one_second() {
        let (vardiff, _) = controller(wide_band_settings());

        let mut current = 15.0;
        let mut now = 1000;
        vardiff.submit("w", current, now);

        // sub-second share spacing; the average clamps to 1 and the
        // worker steps up
        let mut stepped = false;
        for i in 0..400u32 {
            if i % 2 == 0 {
                now += 1;
            }
            if let Some(retarget) = vardiff.submit("w", current, now) {
                assert!(retarget.basediff > current);
                current = retarget.basediff;
                stepped = true;
            }
        }

        assert!(stepped);
    }

    #[test]
    fn workers_are_independent() {
        let (vardiff, _) = controller(wide_band_settings());

        let mut now = 1000;
        vardiff.submit("slow", 15.0, now);
        vardiff.submit("fast", 15.0, now);

        let mut slow_down = false;
        let mut fast_up = false;
        for _ in 0..40 {
            now += 60;
            if let Some(retarget) = vardiff.submit("slow", 15.0, now) {
                slow_down = retarget.basediff < 15.0;
            }
            for tick in [15, 30, 45] {
                if let Some(retarget) = vardiff.submit("fast", 15.0, now - 60 + tick) {
                    fast_up = retarget.basediff > 15.0;
                }
            }
            vardiff.submit("fast", 15.0, now);
        }

        assert!(slow_down);
        assert!(fast_up);
    }

    #[test]
    fn pool_share_is_relative_to_pool_target() {
        let (vardiff, _) = controller(Settings::default());

        assert_eq!(vardiff.pool_share(15.772588724), 1.0);
        assert_eq!(vardiff.pool_share(15.772588724 + stratum::LOG_STEP), 2.0);
    }

    #[test]
    fn forget_discards_state() {
        let (vardiff, identity) = controller(Settings::default());

        vardiff.submit("w", 15.772588724, 1000);
        vardiff.forget("w");
        vardiff.submit("w", 15.772588724, 1030);

        // treated as brand new both times
        assert_eq!(identity.updates.lock().len(), 2);
    }
}
