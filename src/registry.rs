use super::*;

/// Callbacks fired after the registry installs a template. `on_new_block`
/// runs first and only when the chain tip moved.
pub trait TemplateHooks: Send + Sync + 'static {
    fn on_new_block(&self, _height: u64) {}

    /// `clean_jobs` is true when previous jobs became stale and
    /// clients should drop queued work.
    fn on_new_template(&self, _clean_jobs: bool) {}
}

/// For callers that do not broadcast.
impl TemplateHooks for () {}

/// Everything a subscriber needs to start grinding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkUnit {
    pub job_id: JobId,
    pub merkle_root: String,
    pub data: String,
}

#[derive(Default)]
struct Inner {
    /// Live templates grouped by the block they build on. Templates
    /// for any other prevhash are dropped the moment the tip moves.
    prevhashes: HashMap<String, Vec<Arc<BlockTemplate>>>,
    jobs: HashMap<JobId, Arc<BlockTemplate>>,
    last: Option<Arc<BlockTemplate>>,
    last_broadcast: Option<Broadcast>,
    job_counter: u64,
}

/// Owns the set of valid block templates and hands out jobs,
/// extranonces and work to the rest of the pool.
pub struct TemplateRegistry {
    daemon: Arc<dyn DaemonRpc>,
    coinbaser: Arc<dyn Coinbaser>,
    clock: Arc<dyn Timestamper>,
    hooks: Arc<dyn TemplateHooks>,
    settings: Settings,
    extranonces: Mutex<ExtranonceCounter>,
    update_in_progress: AtomicBool,
    inner: Mutex<Inner>,
}

impl TemplateRegistry {
    pub fn new(
        daemon: Arc<dyn DaemonRpc>,
        coinbaser: Arc<dyn Coinbaser>,
        clock: Arc<dyn Timestamper>,
        hooks: Arc<dyn TemplateHooks>,
        settings: Settings,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            daemon,
            coinbaser,
            clock,
            hooks,
            extranonces: Mutex::new(ExtranonceCounter::new(settings.instance_id)?),
            settings,
            update_in_progress: AtomicBool::new(false),
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Fetches a fresh template from the daemon and installs it.
    /// Concurrent calls coalesce; only the first does the poll.
    pub async fn update_block(&self) {
        if self
            .update_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("template update already in progress");
            return;
        }

        let start = self.clock.now();

        match self.daemon.get_block_template().await {
            Ok(raw) => {
                let transactions = raw.transactions.len();

                if let Err(err) = self.add_template(&raw) {
                    error!("failed to build template: {err}");
                } else {
                    info!(
                        elapsed = self.clock.now().saturating_sub(start),
                        transactions, "template update finished",
                    );
                }
            }
            Err(err) => error!("getblocktemplate failed: {err}"),
        }

        // held through installation so an overlapping trigger cannot
        // start a second poll against a half-installed template
        self.update_in_progress.store(false, Ordering::SeqCst);
    }

    fn add_template(&self, raw: &RawBlockTemplate) -> Result {
        let job_id = {
            let mut inner = self.inner.lock();
            inner.job_counter = inner.job_counter % JOB_ID_MODULUS + 1;
            JobId::from(inner.job_counter)
        };

        let template = Arc::new(BlockTemplate::build(
            raw,
            job_id,
            self.clock.now(),
            self.coinbaser.as_ref(),
            &self.settings.coinbase_extras,
        )?);

        let prevhash = template.prevhash.to_hex();
        let height = template.height;

        let new_block = {
            let mut inner = self.inner.lock();
            let new_block = !inner.prevhashes.contains_key(&prevhash);

            inner
                .prevhashes
                .entry(prevhash.clone())
                .or_default()
                .push(template.clone());

            inner.jobs.insert(job_id, template.clone());

            let Inner {
                prevhashes, jobs, ..
            } = &mut *inner;

            prevhashes.retain(|ph, templates| {
                if *ph == prevhash {
                    return true;
                }

                for stale in templates {
                    jobs.remove(&stale.job_id);
                }

                false
            });

            inner.last_broadcast = Some(template.broadcast(new_block));
            inner.last = Some(template);

            new_block
        };

        info!(%prevhash, %job_id, "new template");

        if new_block {
            self.hooks.on_new_block(height);
        }

        self.hooks.on_new_template(new_block);

        Ok(())
    }

    pub fn get_job(&self, job_id: JobId) -> Option<Arc<BlockTemplate>> {
        let job = self.inner.lock().jobs.get(&job_id).cloned();

        if job.is_none() {
            info!(%job_id, "job not found");
        }

        job
    }

    /// Announcement for the most recent template. Errors before the
    /// first successful update.
    pub fn last_broadcast(&self) -> Result<Broadcast> {
        self.inner
            .lock()
            .last_broadcast
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no block template registered yet"))
    }

    /// Unique extranonce1 for a new subscription.
    pub fn new_extranonce1(&self) -> Extranonce {
        self.extranonces.lock().next()
    }

    pub fn extranonce2_size(&self) -> usize {
        self.extranonces.lock().extranonce2_size()
    }

    /// Current work for a subscriber, with the merkle root already
    /// bound to its extranonce1.
    pub fn assemble_work(&self, extranonce1: &Extranonce) -> Result<WorkUnit> {
        let (template, broadcast) = {
            let inner = self.inner.lock();
            (
                inner
                    .last
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no block template registered yet"))?,
                inner
                    .last_broadcast
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no block template registered yet"))?,
            )
        };

        let merkle_root = template.merkle_root_hex(extranonce1)?;
        let data = broadcast.work_data(&merkle_root);

        Ok(WorkUnit {
            job_id: template.job_id,
            merkle_root,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{block_template::tests::raw_template, clock::test_support::FixedTimestamper},
        pretty_assertions::assert_eq,
    };

    struct StaticDaemon {
        template: RawBlockTemplate,
    }

    #[async_trait]
    impl DaemonRpc for StaticDaemon {
        async fn get_block_template(&self) -> Result<RawBlockTemplate> {
            Ok(self.template.clone())
        }

        async fn submit_block(&self, _: &str, _: &str, _: &str) -> Result<bool> {
            Ok(true)
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        blocks: Mutex<Vec<u64>>,
        templates: Mutex<Vec<bool>>,
    }

    impl TemplateHooks for RecordingHooks {
        fn on_new_block(&self, height: u64) {
            self.blocks.lock().push(height);
        }

        fn on_new_template(&self, clean_jobs: bool) {
            self.templates.lock().push(clean_jobs);
        }
    }

    fn registry(hooks: Arc<dyn TemplateHooks>) -> TemplateRegistry {
        TemplateRegistry::new(
            Arc::new(StaticDaemon {
                template: raw_template(),
            }),
            Arc::new(ScriptCoinbaser::new(vec![0x51])),
            Arc::new(FixedTimestamper::new(1700000000)),
            hooks,
            Settings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_registry_has_no_broadcast() {
        let registry = registry(Arc::new(()));

        assert!(registry.last_broadcast().is_err());
        assert!(registry.get_job(JobId::from(1)).is_none());
    }

    #[tokio::test]
    async fn update_installs_template_and_fires_hooks() {
        let hooks = Arc::new(RecordingHooks::default());
        let registry = registry(hooks.clone());

        registry.update_block().await;

        let broadcast = registry.last_broadcast().unwrap();
        assert_eq!(broadcast.job_id, JobId::from(1));
        assert!(broadcast.clean_jobs);
        assert!(registry.get_job(JobId::from(1)).is_some());

        assert_eq!(*hooks.blocks.lock(), [1000]);
        assert_eq!(*hooks.templates.lock(), [true]);
    }

    #[tokio::test]
    async fn same_prevhash_keeps_old_jobs_live() {
        let hooks = Arc::new(RecordingHooks::default());
        let registry = registry(hooks.clone());

        registry.update_block().await;
        registry.update_block().await;

        assert!(registry.get_job(JobId::from(1)).is_some());
        assert!(registry.get_job(JobId::from(2)).is_some());

        // second template is a refresh, not a new chain tip
        assert_eq!(*hooks.blocks.lock(), [1000]);
        assert_eq!(*hooks.templates.lock(), [true, false]);
        assert!(!registry.last_broadcast().unwrap().clean_jobs);
    }

    #[tokio::test]
    async fn new_prevhash_evicts_stale_jobs() {
        let registry = registry(Arc::new(()));
        registry.update_block().await;

        let mut moved = raw_template();
        moved.previousblockhash =
            "00000000000000000000000000000000000000000000000000000000000000aa"
                .parse()
                .unwrap();
        moved.height = 1001;
        registry.add_template(&moved).unwrap();

        assert!(registry.get_job(JobId::from(1)).is_none());
        assert!(registry.get_job(JobId::from(2)).is_some());
        assert!(registry.last_broadcast().unwrap().clean_jobs);
    }

    #[tokio::test]
    async fn extranonces_are_unique_per_subscription() {
        let registry = registry(Arc::new(()));

        let first = registry.new_extranonce1();
        let second = registry.new_extranonce1();

        assert_ne!(first, second);
        assert_eq!(registry.extranonce2_size(), 4);
    }

    #[tokio::test]
    async fn assemble_work_binds_extranonce() {
        let registry = registry(Arc::new(()));
        registry.update_block().await;

        let extranonce1 = registry.new_extranonce1();
        let work = registry.assemble_work(&extranonce1).unwrap();

        assert_eq!(work.job_id, JobId::from(1));
        assert_eq!(work.data.len(), 160);
        assert!(work.data.contains(&work.merkle_root));

        let other = registry.assemble_work(&registry.new_extranonce1()).unwrap();
        assert_ne!(work.merkle_root, other.merkle_root);
    }

    #[derive(Default)]
    struct GuardWatchingHooks {
        registry: Mutex<Option<Arc<TemplateRegistry>>>,
        guard_during_install: Mutex<Vec<bool>>,
    }

    impl TemplateHooks for GuardWatchingHooks {
        fn on_new_template(&self, _clean_jobs: bool) {
            if let Some(registry) = &*self.registry.lock() {
                self.guard_during_install
                    .lock()
                    .push(registry.update_in_progress.load(Ordering::SeqCst));
            }
        }
    }

    #[tokio::test]
    async fn update_guard_is_held_until_template_installed() {
        let hooks = Arc::new(GuardWatchingHooks::default());
        let registry = Arc::new(registry(hooks.clone()));
        *hooks.registry.lock() = Some(registry.clone());

        registry.update_block().await;

        assert_eq!(*hooks.guard_during_install.lock(), [true]);
        assert!(!registry.update_in_progress.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn job_ids_wrap_before_modulus() {
        let registry = registry(Arc::new(()));
        registry.inner.lock().job_counter = JOB_ID_MODULUS - 1;

        registry.update_block().await;
        assert!(registry.get_job(JobId::from(JOB_ID_MODULUS)).is_some());

        registry.update_block().await;
        assert!(registry.get_job(JobId::from(1)).is_some());
    }
}
