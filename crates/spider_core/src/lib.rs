//! Spider core: pure scan state machine, seed selection and site-tree contracts.
mod discovery;
mod effect;
mod message;
mod msg;
mod seeds;
mod site;
mod state;
mod update;
mod view_model;

pub use discovery::{DiscoveryRecord, FetchStatus};
pub use effect::Effect;
pub use message::{HttpMessage, RequestHeader, ResponseHeader};
pub use msg::{CrawlerEvent, Msg};
pub use seeds::{select_seeds, ScanTarget, SeedError, SeedRecord, SeedSelection, SkippedSeed};
pub use site::{
    HistoryHandle, HistoryType, NodeRef, ScanContext, SiteNode, SiteTree, SiteTreeError,
};
pub use state::{ScanOptions, ScanRun, ScanState};
pub use update::update;
pub use view_model::ScanView;
