//! Scan controller: owns one spider run over a site.
//!
//! Control calls (`pause`, `resume`, `stop`, `reset`) and crawler events both go through the
//! pure [`spider_core::update`] under a single lock; the resulting effects run after the
//! lock is released so that listeners and the crawler may call back in.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use spider_core::{
    select_seeds, update, CrawlerEvent, Effect, HistoryType, HttpMessage, Msg, NodeRef,
    ScanOptions, ScanRun, ScanState, ScanTarget, ScanView, SeedError, SiteTree,
};
use spider_logging::{spider_debug, spider_error, spider_info, spider_warn};

use crate::{
    CrawlerFactory, CrawlerHandle, CrawlerListener, EventSender, NullListener, ResultsLog,
    ScanError, ScanListener, Sequenced,
};

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(25);

struct RegisteredListener {
    /// First event sequence number this listener may see.
    from_seq: u64,
    listener: Arc<dyn CrawlerListener>,
}

pub struct ScanController {
    site: String,
    options: ScanOptions,
    tree: Arc<dyn SiteTree>,
    factory: Arc<dyn CrawlerFactory>,
    owner: Arc<dyn ScanListener>,
    run: Mutex<ScanRun>,
    start_node: Mutex<Option<NodeRef>>,
    crawler: Mutex<Option<Arc<dyn CrawlerHandle>>>,
    listeners: Mutex<Vec<RegisteredListener>>,
    results: ResultsLog,
    next_seq: Arc<AtomicU64>,
    starting: Mutex<()>,
    /// Held from a state change until the crawler calls it implies have run.
    control: Mutex<()>,
}

impl ScanController {
    pub fn new(
        site: impl Into<String>,
        options: ScanOptions,
        tree: Arc<dyn SiteTree>,
        factory: Arc<dyn CrawlerFactory>,
    ) -> Self {
        let site = site.into();
        spider_debug!("Initializing spider controller for site {}", site);
        Self {
            run: Mutex::new(ScanRun::new(site.clone())),
            site,
            options,
            tree,
            factory,
            owner: Arc::new(NullListener),
            start_node: Mutex::new(None),
            crawler: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            results: ResultsLog::new(),
            next_seq: Arc::new(AtomicU64::new(0)),
            starting: Mutex::new(()),
            control: Mutex::new(()),
        }
    }

    pub fn with_owner(mut self, owner: Arc<dyn ScanListener>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_start_node(self, node: NodeRef) -> Self {
        self.set_start_node(Some(node));
        self
    }

    /// Runs the scan to the end on a dedicated thread.
    pub fn spawn(self: &Arc<Self>) -> thread::JoinHandle<Result<ScanView, ScanError>> {
        let controller = Arc::clone(self);
        thread::spawn(move || controller.run())
    }

    /// Starts the scan and blocks until it is stopped or the crawler completes.
    pub fn run(&self) -> Result<ScanView, ScanError> {
        let events = self.start()?;
        self.process_events(&events);
        Ok(self.view())
    }

    pub fn pause(&self) {
        self.dispatch(Msg::PauseRequested, None);
    }

    pub fn resume(&self) {
        self.dispatch(Msg::ResumeRequested, None);
    }

    /// Stops the scan. Returns immediately; the crawler winds down on its own.
    pub fn stop(&self) {
        self.dispatch(Msg::StopRequested, None);
    }

    /// Returns a finished run to idle, dropping its results and crawler.
    pub fn reset(&self) {
        if self.is_running() {
            spider_warn!("Ignoring reset of {} while the scan is running", self.site);
            return;
        }
        self.dispatch(Msg::ResetRequested, None);
    }

    /// Registers a listener for raw crawler events sent from now on.
    pub fn add_listener(&self, listener: Arc<dyn CrawlerListener>) {
        let from_seq = self.next_seq.load(Ordering::SeqCst);
        lock(&self.listeners).push(RegisteredListener { from_seq, listener });
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn start_node(&self) -> Option<NodeRef> {
        lock(&self.start_node).clone()
    }

    pub fn set_start_node(&self, node: Option<NodeRef>) {
        *lock(&self.start_node) = node;
    }

    pub fn state(&self) -> ScanState {
        lock(&self.run).state()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == ScanState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn progress(&self) -> u8 {
        lock(&self.run).percent()
    }

    pub fn maximum(&self) -> u32 {
        lock(&self.run).maximum()
    }

    pub fn view(&self) -> ScanView {
        lock(&self.run).view()
    }

    pub fn results(&self) -> ResultsLog {
        self.results.clone()
    }

    fn start(&self) -> Result<mpsc::Receiver<Sequenced>, ScanError> {
        let _starting = lock(&self.starting);
        let state = self.state();
        if state != ScanState::Idle {
            return Err(ScanError::NotIdle(state));
        }
        spider_info!("Starting spider scan on {}", self.site);

        let start_node = self.resolve_start_node()?;
        let (events, receiver) = EventSender::channel(Arc::clone(&self.next_seq));
        let crawler: Arc<dyn CrawlerHandle> = match self.factory.build(events) {
            Ok(crawler) => Arc::from(crawler),
            Err(err) => {
                spider_error!("Spider for {} could not be built: {}", self.site, err);
                return Err(err.into());
            }
        };
        crawler.set_exclude_list(&self.options.exclude);
        self.submit_seeds(crawler.as_ref(), start_node)?;
        *lock(&self.crawler) = Some(crawler);

        self.dispatch(Msg::Started, None);
        Ok(receiver)
    }

    fn resolve_start_node(&self) -> Result<Option<NodeRef>, ScanError> {
        let mut slot = lock(&self.start_node);
        if slot.is_none() && !self.options.scan_entire_scope {
            let Some(node) = self.tree.resolve_start_node(&self.site) else {
                spider_error!(
                    "Spider cannot start - no start node set for site {}",
                    self.site
                );
                return Err(ScanError::NoStartNode {
                    site: self.site.clone(),
                });
            };
            spider_debug!("Start node automatically found for site {}", self.site);
            *slot = Some(node);
        }
        Ok(slot.clone())
    }

    fn submit_seeds(
        &self,
        crawler: &dyn CrawlerHandle,
        start_node: Option<NodeRef>,
    ) -> Result<(), ScanError> {
        let target = self.options.target(start_node);
        if let ScanTarget::ScopeWide { context } = &target {
            match context {
                Some(context) => spider_debug!("Adding seeds for scan of all in context {}", context.name),
                None => spider_debug!("Adding seeds for scan of all in scope"),
            }
        }

        let selection = select_seeds(&target, self.tree.as_ref()).map_err(|err| match err {
            SeedError::MissingStartNode => ScanError::NoStartNode {
                site: self.site.clone(),
            },
        })?;
        for skipped in &selection.skipped {
            spider_error!(
                "Error while adding seed {} for spider scan: {}",
                skipped.node,
                skipped.error
            );
        }
        spider_debug!(
            "Seeding spider for {} with {} pages",
            self.site,
            selection.seeds.len()
        );
        for seed in selection.seeds {
            crawler.add_seed(seed.message);
        }
        Ok(())
    }

    fn process_events(&self, events: &mpsc::Receiver<Sequenced>) {
        while self.is_running() {
            match events.recv_timeout(EVENT_POLL_INTERVAL) {
                Ok(Sequenced { seq, event }) => self.handle_event(seq, event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if self.is_running() {
                        spider_error!(
                            "Spider for {} went away without reporting completion",
                            self.site
                        );
                        self.dispatch(
                            Msg::Crawler(CrawlerEvent::Completed { successful: false }),
                            None,
                        );
                    }
                    break;
                }
            }
        }
    }

    fn handle_event(&self, seq: u64, event: CrawlerEvent) {
        if let CrawlerEvent::Completed { successful } = event {
            if successful {
                spider_info!("Spider scan of {} complete", self.site);
            } else {
                spider_warn!("Spider scan of {} complete: crawler reported failure", self.site);
            }
        }
        self.dispatch(Msg::Crawler(event), Some(seq));
    }

    fn dispatch(&self, msg: Msg, seq: Option<u64>) {
        let control = lock(&self.control);
        let effects = {
            let mut run = lock(&self.run);
            let (next, effects) = update(std::mem::take(&mut *run), msg);
            *run = next;
            effects
        };
        // Crawler calls reach the crawler in the order the state changed; owner and
        // listener callbacks run after the control lock is released.
        let (crawler_calls, callbacks): (Vec<Effect>, Vec<Effect>) =
            effects.into_iter().partition(Effect::is_crawler_control);
        for effect in crawler_calls {
            self.execute(effect, seq);
        }
        drop(control);
        for effect in callbacks {
            self.execute(effect, seq);
        }
    }

    fn execute(&self, effect: Effect, seq: Option<u64>) {
        match effect {
            Effect::StartCrawler => self.with_crawler(|crawler| crawler.start()),
            Effect::PauseCrawler => self.with_crawler(|crawler| crawler.pause()),
            Effect::ResumeCrawler => self.with_crawler(|crawler| crawler.resume()),
            Effect::StopCrawler => self.with_crawler(|crawler| crawler.stop()),
            Effect::ReportProgress { done, total } => {
                self.owner.on_progress(&self.site, done, total);
            }
            Effect::RecordDiscovery(record) => self.results.push(record),
            Effect::FoundCountChanged(count) => self.owner.on_found_count(&self.site, count),
            Effect::PersistMessage(message) => self.persist(&message),
            Effect::NotifyFinished => self.owner.on_scan_finished(&self.site),
            Effect::ForwardEvent(event) => self.forward(seq, &event),
            Effect::ClearResults => self.results.clear(),
            Effect::ReleaseCrawler => {
                lock(&self.crawler).take();
            }
        }
    }

    fn with_crawler(&self, action: impl FnOnce(&dyn CrawlerHandle)) {
        let crawler = lock(&self.crawler).clone();
        if let Some(crawler) = crawler {
            action(crawler.as_ref());
        }
    }

    fn persist(&self, message: &HttpMessage) {
        let stored = self
            .tree
            .persist(HistoryType::Spider, message)
            .and_then(|handle| self.tree.add_path(handle, message));
        if let Err(err) = stored {
            spider_warn!("Failed to add {} to the site tree: {}", message.uri(), err);
        }
    }

    fn forward(&self, seq: Option<u64>, event: &CrawlerEvent) {
        let listeners: Vec<Arc<dyn CrawlerListener>> = lock(&self.listeners)
            .iter()
            .filter(|registered| seq.map_or(true, |seq| seq >= registered.from_seq))
            .map(|registered| Arc::clone(&registered.listener))
            .collect();
        for listener in listeners {
            listener.on_event(event);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
