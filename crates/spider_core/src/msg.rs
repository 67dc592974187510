use crate::{FetchStatus, HttpMessage};

/// Notifications a crawler delivers while a scan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlerEvent {
    /// Overall progress; `remaining` counts URIs still queued.
    Progress {
        percent: u8,
        crawled: u32,
        remaining: u32,
    },
    /// A URI was discovered and passed through the fetch filters.
    UriFound {
        uri: String,
        method: String,
        status: FetchStatus,
    },
    /// A URI was fetched.
    UriRead(HttpMessage),
    /// The crawler finished. Delivered exactly once per run.
    Completed { successful: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Crawler is built and seeded; the run may begin.
    Started,
    /// User asked to pause.
    PauseRequested,
    /// User asked to resume.
    ResumeRequested,
    /// User asked to stop.
    StopRequested,
    /// Return a finished (or never started) run to idle.
    ResetRequested,
    /// Event delivered by the crawler.
    Crawler(CrawlerEvent),
}
