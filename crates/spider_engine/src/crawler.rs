use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use spider_core::{CrawlerEvent, HttpMessage};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlerError {
    #[error("crawler could not be built: {0}")]
    Build(String),
}

/// Control surface of a crawling engine.
///
/// Implementations run asynchronously and report through the [`EventSender`] they were
/// built with. Every run must end with exactly one [`CrawlerEvent::Completed`].
pub trait CrawlerHandle: Send + Sync {
    fn set_exclude_list(&self, patterns: &[String]);
    fn add_seed(&self, seed: HttpMessage);
    fn start(&self);
    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
}

/// Builds a crawler wired to its event sender up front.
pub trait CrawlerFactory: Send + Sync {
    fn build(&self, events: EventSender) -> Result<Box<dyn CrawlerHandle>, CrawlerError>;
}

/// Observer of raw crawler events, fanned out by the scan controller.
pub trait CrawlerListener: Send + Sync {
    fn on_event(&self, event: &CrawlerEvent);
}

/// Event stamped with the order in which it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced {
    pub seq: u64,
    pub event: CrawlerEvent,
}

/// Sending half of the single ordered channel from a crawler to its controller.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Sequenced>,
    next_seq: Arc<AtomicU64>,
}

impl EventSender {
    pub fn channel(next_seq: Arc<AtomicU64>) -> (Self, mpsc::Receiver<Sequenced>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx, next_seq }, rx)
    }

    /// Returns false once the controller has gone away.
    pub fn send(&self, event: CrawlerEvent) -> bool {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.tx.send(Sequenced { seq, event }).is_ok()
    }
}
