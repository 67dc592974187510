//! Spider engine: scan controller, crawler contracts and a reference HTTP crawler.
mod controller;
mod crawler;
mod decode;
mod error;
mod fetch;
mod http_crawler;
mod links;
mod listener;
mod results;
mod site_map;

pub use controller::ScanController;
pub use crawler::{
    CrawlerError, CrawlerFactory, CrawlerHandle, CrawlerListener, EventSender, Sequenced,
};
pub use decode::decode_body;
pub use error::ScanError;
pub use fetch::{FailureKind, FetchError, FetchSettings, Fetcher, ReqwestFetcher};
pub use http_crawler::{CrawlSettings, HttpCrawler, HttpCrawlerFactory};
pub use links::extract_links;
pub use listener::{NullListener, ScanListener};
pub use results::ResultsLog;
pub use site_map::{MemoryNode, MemorySiteTree};
