//! Reference crawler: breadth-first over HTTP, reporting through the crawler event protocol.
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use regex::Regex;
use spider_core::{CrawlerEvent, FetchStatus, HttpMessage};
use spider_logging::{spider_debug, spider_error, spider_warn};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::{decode_body, extract_links, CrawlerError, CrawlerFactory, CrawlerHandle, EventSender};

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub fetch: FetchSettings,
    /// Links are followed from pages up to this many hops away from a seed.
    pub max_depth: usize,
    pub max_pages: usize,
    pub max_concurrency: usize,
    pub max_links_per_page: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            max_depth: 5,
            max_pages: 1_000,
            max_concurrency: 4,
            max_links_per_page: 5_000,
        }
    }
}

pub struct HttpCrawlerFactory {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
}

impl HttpCrawlerFactory {
    pub fn new(settings: CrawlSettings) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::new(settings.fetch.clone()));
        Self { settings, fetcher }
    }

    pub fn with_fetcher(settings: CrawlSettings, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { settings, fetcher }
    }
}

impl CrawlerFactory for HttpCrawlerFactory {
    fn build(&self, events: EventSender) -> Result<Box<dyn CrawlerHandle>, CrawlerError> {
        if self.settings.max_concurrency == 0 {
            return Err(CrawlerError::Build("max_concurrency must be at least 1".into()));
        }
        Ok(Box::new(HttpCrawler::new(
            self.settings.clone(),
            Arc::clone(&self.fetcher),
            events,
        )))
    }
}

pub struct HttpCrawler {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    /// Moved to the crawl thread on start, so the channel closes if that thread dies.
    events: Mutex<Option<EventSender>>,
    seeds: Mutex<Vec<HttpMessage>>,
    exclude: Mutex<Vec<Regex>>,
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl HttpCrawler {
    pub fn new(settings: CrawlSettings, fetcher: Arc<dyn Fetcher>, events: EventSender) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            settings,
            fetcher,
            events: Mutex::new(Some(events)),
            seeds: Mutex::new(Vec::new()),
            exclude: Mutex::new(Vec::new()),
            paused,
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }
}

impl CrawlerHandle for HttpCrawler {
    fn set_exclude_list(&self, patterns: &[String]) {
        let compiled = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    spider_warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, err);
                    None
                }
            })
            .collect();
        *self.exclude.lock().unwrap_or_else(PoisonError::into_inner) = compiled;
    }

    fn add_seed(&self, seed: HttpMessage) {
        if self.started.load(Ordering::SeqCst) {
            spider_debug!("Ignoring seed {} added after start", seed.uri());
            return;
        }
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(seed);
    }

    fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(events) = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };
        let seeds = std::mem::take(&mut *self.seeds.lock().unwrap_or_else(PoisonError::into_inner));
        let crawl = Crawl {
            settings: self.settings.clone(),
            fetcher: Arc::clone(&self.fetcher),
            events: events.clone(),
            exclude: self
                .exclude
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            paused: self.paused.subscribe(),
            cancel: self.cancel.clone(),
        };
        thread::spawn(move || {
            let successful = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime.block_on(crawl.run(seeds)),
                Err(err) => {
                    spider_error!("Spider runtime could not start: {}", err);
                    false
                }
            };
            events.send(CrawlerEvent::Completed { successful });
        });
    }

    fn pause(&self) {
        self.paused.send_replace(true);
    }

    fn resume(&self) {
        self.paused.send_replace(false);
    }

    fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for HttpCrawler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Crawl {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    events: EventSender,
    exclude: Vec<Regex>,
    paused: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl Crawl {
    /// Returns false when cut short by `stop`.
    async fn run(mut self, seeds: Vec<HttpMessage>) -> bool {
        let mut frontier: VecDeque<(Url, usize)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut hosts: HashSet<String> = HashSet::new();

        for seed in seeds {
            let uri = seed.uri().clone();
            if let Some(host) = uri.host_str() {
                hosts.insert(host.to_ascii_lowercase());
            }
            if visited.insert(uri.to_string()) {
                self.emit(CrawlerEvent::UriFound {
                    uri: uri.to_string(),
                    method: seed.request.method.clone(),
                    status: FetchStatus::Seed,
                });
                frontier.push_back((uri, 0));
            }
        }

        let mut in_flight = JoinSet::new();
        let mut dispatched = 0usize;
        let mut crawled = 0u32;
        loop {
            if !self.wait_while_paused().await {
                in_flight.abort_all();
                return false;
            }

            while in_flight.len() < self.settings.max_concurrency
                && dispatched < self.settings.max_pages
            {
                let Some((uri, depth)) = frontier.pop_front() else {
                    break;
                };
                dispatched += 1;
                let fetcher = Arc::clone(&self.fetcher);
                in_flight.spawn(async move {
                    let result = fetcher.fetch(&uri).await;
                    (uri, depth, result)
                });
            }

            let next = tokio::select! {
                _ = self.cancel.cancelled() => None,
                joined = in_flight.join_next() => Some(joined),
            };
            let Some(joined) = next else {
                in_flight.abort_all();
                return false;
            };
            // Nothing in flight and nothing left to dispatch.
            let Some(joined) = joined else {
                break;
            };

            crawled += 1;
            match joined {
                Ok((uri, depth, Ok(message))) => {
                    if depth < self.settings.max_depth && message.response.is_html() {
                        self.follow_links(&uri, depth, &message, &hosts, &mut visited, &mut frontier);
                    }
                    self.emit(CrawlerEvent::UriRead(message));
                }
                Ok((uri, _, Err(err))) => spider_debug!("Spider failed to fetch {}: {}", uri, err),
                // A panicking fetcher takes the crawl down with it; the controller
                // sees the event channel close without a completion.
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => spider_warn!("Spider fetch task failed: {}", err),
            }

            let budget_left = self.settings.max_pages.saturating_sub(dispatched);
            let remaining = (frontier.len().min(budget_left) + in_flight.len()) as u32;
            let total = crawled + remaining;
            let percent = if total == 0 {
                100
            } else {
                (u64::from(crawled) * 100 / u64::from(total)) as u8
            };
            self.emit(CrawlerEvent::Progress {
                percent,
                crawled,
                remaining,
            });
        }
        true
    }

    fn follow_links(
        &self,
        page: &Url,
        depth: usize,
        message: &HttpMessage,
        hosts: &HashSet<String>,
        visited: &mut HashSet<String>,
        frontier: &mut VecDeque<(Url, usize)>,
    ) {
        let html = decode_body(&message.body, message.response.content_type.as_deref());
        for link in extract_links(&html, page, self.settings.max_links_per_page) {
            if !visited.insert(link.to_string()) {
                continue;
            }
            let status = self.classify(&link, hosts);
            self.emit(CrawlerEvent::UriFound {
                uri: link.to_string(),
                method: "GET".to_string(),
                status,
            });
            if status == FetchStatus::Valid {
                frontier.push_back((link, depth + 1));
            }
        }
    }

    fn classify(&self, uri: &Url, hosts: &HashSet<String>) -> FetchStatus {
        if !matches!(uri.scheme(), "http" | "https") {
            return FetchStatus::IllegalProtocol;
        }
        let same_host = uri
            .host_str()
            .is_some_and(|host| hosts.contains(&host.to_ascii_lowercase()));
        if !same_host {
            return FetchStatus::OutOfScope;
        }
        if self.exclude.iter().any(|regex| regex.is_match(uri.as_str())) {
            return FetchStatus::UserRules;
        }
        FetchStatus::Valid
    }

    async fn wait_while_paused(&mut self) -> bool {
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            if !*self.paused.borrow_and_update() {
                return true;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    fn emit(&self, event: CrawlerEvent) {
        if !self.events.send(event) {
            // Nobody is listening any more.
            self.cancel.cancel();
        }
    }
}
