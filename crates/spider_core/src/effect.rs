use crate::{CrawlerEvent, DiscoveryRecord, HttpMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartCrawler,
    PauseCrawler,
    ResumeCrawler,
    StopCrawler,
    ReportProgress { done: u32, total: u32 },
    RecordDiscovery(DiscoveryRecord),
    FoundCountChanged(usize),
    PersistMessage(HttpMessage),
    NotifyFinished,
    ForwardEvent(CrawlerEvent),
    ClearResults,
    ReleaseCrawler,
}

impl Effect {
    /// Effects that drive the crawler itself rather than notify observers.
    pub fn is_crawler_control(&self) -> bool {
        matches!(
            self,
            Effect::StartCrawler
                | Effect::PauseCrawler
                | Effect::ResumeCrawler
                | Effect::StopCrawler
        )
    }
}
