use spider_core::ScanState;
use thiserror::Error;

use crate::CrawlerError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("spider cannot start - no start node set for site {site}")]
    NoStartNode { site: String },
    #[error("scan cannot start from state {0:?}")]
    NotIdle(ScanState),
    #[error(transparent)]
    Crawler(#[from] CrawlerError),
}
