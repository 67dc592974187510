use std::sync::Once;

use pretty_assertions::assert_eq;
use spider_core::{
    update, CrawlerEvent, DiscoveryRecord, Effect, FetchStatus, HttpMessage, Msg, ScanRun,
    ScanState,
};
use url::Url;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(spider_logging::initialize_for_tests);
}

fn running() -> ScanRun {
    let (run, effects) = update(ScanRun::new("http://example.com"), Msg::Started);
    assert_eq!(effects, vec![Effect::StartCrawler]);
    run
}

fn found(uri: &str, status: FetchStatus) -> Msg {
    Msg::Crawler(CrawlerEvent::UriFound {
        uri: uri.to_string(),
        method: "GET".to_string(),
        status,
    })
}

#[test]
fn new_run_is_idle_with_one_remaining() {
    init_logging();
    let view = ScanRun::new("http://example.com").view();

    assert_eq!(view.state, ScanState::Idle);
    assert_eq!(view.crawled, 0);
    assert_eq!(view.remaining, 1);
    assert_eq!(view.maximum, 1);
    assert!(!view.is_running());
}

#[test]
fn pause_and_resume_round_trip() {
    init_logging();
    let (run, effects) = update(running(), Msg::PauseRequested);
    assert_eq!(run.state(), ScanState::Paused);
    assert_eq!(effects, vec![Effect::PauseCrawler]);

    // Pausing twice does nothing.
    let (run, effects) = update(run, Msg::PauseRequested);
    assert_eq!(run.state(), ScanState::Paused);
    assert!(effects.is_empty());

    let (run, effects) = update(run, Msg::ResumeRequested);
    assert_eq!(run.state(), ScanState::Running);
    assert_eq!(effects, vec![Effect::ResumeCrawler]);
}

#[test]
fn resume_without_pause_is_ignored() {
    init_logging();
    let (run, effects) = update(running(), Msg::ResumeRequested);
    assert_eq!(run.state(), ScanState::Running);
    assert!(effects.is_empty());
}

#[test]
fn stop_notifies_once_and_is_idempotent() {
    init_logging();
    for start in [
        ScanRun::new("http://example.com"),
        running(),
        update(running(), Msg::PauseRequested).0,
    ] {
        let (run, effects) = update(start, Msg::StopRequested);
        assert_eq!(run.state(), ScanState::Stopped);
        assert_eq!(effects, vec![Effect::StopCrawler, Effect::NotifyFinished]);

        let (run, effects) = update(run, Msg::StopRequested);
        assert_eq!(run.state(), ScanState::Stopped);
        assert!(effects.is_empty());
    }
}

#[test]
fn only_crawler_commands_count_as_crawler_control() {
    let (_, effects) = update(running(), Msg::StopRequested);
    let control: Vec<bool> = effects.iter().map(Effect::is_crawler_control).collect();
    assert_eq!(control, vec![true, false]);
    assert!(Effect::PauseCrawler.is_crawler_control());
    assert!(!Effect::ReleaseCrawler.is_crawler_control());
}

#[test]
fn progress_is_last_write_wins() {
    init_logging();
    let progress = |crawled, remaining| {
        Msg::Crawler(CrawlerEvent::Progress {
            percent: 10,
            crawled,
            remaining,
        })
    };

    let (run, effects) = update(running(), progress(10, 90));
    assert_eq!(
        effects[0],
        Effect::ReportProgress {
            done: 10,
            total: 100
        }
    );

    // Stale update delivered out of order is still applied.
    let (run, effects) = update(run, progress(5, 95));
    assert_eq!(run.crawled(), 5);
    assert_eq!(run.remaining(), 95);
    assert_eq!(
        effects[0],
        Effect::ReportProgress {
            done: 5,
            total: 100
        }
    );
}

#[test]
fn found_uris_are_classified_in_order() {
    init_logging();
    let (run, first) = update(running(), found("http://example.com/a", FetchStatus::Seed));
    let (run, second) = update(run, found("http://example.com/b", FetchStatus::Valid));
    let (run, third) = update(run, found("ftp://example.com/c", FetchStatus::IllegalProtocol));

    assert_eq!(run.found(), 3);
    assert_eq!(
        first[0],
        Effect::RecordDiscovery(DiscoveryRecord::new(
            "http://example.com/a",
            "GET",
            Some("SEED".to_string()),
            false
        ))
    );
    assert_eq!(first[1], Effect::FoundCountChanged(1));
    assert_eq!(
        second[0],
        Effect::RecordDiscovery(DiscoveryRecord::new("http://example.com/b", "GET", None, false))
    );
    assert_eq!(
        third[0],
        Effect::RecordDiscovery(DiscoveryRecord::new(
            "ftp://example.com/c",
            "GET",
            Some("ILLEGAL_PROTOCOL".to_string()),
            true
        ))
    );
}

#[test]
fn read_uri_is_persisted_and_forwarded() {
    init_logging();
    let message = HttpMessage::get(Url::parse("http://example.com/page").unwrap())
        .with_response(200, Some("text/html"));
    let event = CrawlerEvent::UriRead(message.clone());

    let (_run, effects) = update(running(), Msg::Crawler(event.clone()));
    assert_eq!(
        effects,
        vec![Effect::PersistMessage(message), Effect::ForwardEvent(event)]
    );
}

#[test]
fn completion_ends_run_regardless_of_outcome() {
    init_logging();
    for successful in [true, false] {
        let event = CrawlerEvent::Completed { successful };
        let (run, effects) = update(running(), Msg::Crawler(event.clone()));

        assert_eq!(run.state(), ScanState::Completed);
        assert_eq!(run.completion(), Some(successful));
        assert!(!run.view().is_running());
        assert_eq!(
            effects,
            vec![Effect::NotifyFinished, Effect::ForwardEvent(event)]
        );
    }
}

#[test]
fn events_after_termination_are_dropped() {
    init_logging();
    let (run, _) = update(running(), Msg::StopRequested);

    let (run, effects) = update(run, found("http://example.com/late", FetchStatus::Valid));
    assert!(effects.is_empty());
    assert_eq!(run.found(), 0);

    let (run, effects) = update(run, Msg::Crawler(CrawlerEvent::Completed { successful: true }));
    assert!(effects.is_empty());
    assert_eq!(run.state(), ScanState::Stopped);
}

#[test]
fn events_before_start_are_dropped() {
    init_logging();
    let (run, effects) = update(
        ScanRun::new("http://example.com"),
        found("http://example.com/early", FetchStatus::Valid),
    );
    assert!(effects.is_empty());
    assert_eq!(run.state(), ScanState::Idle);
}

#[test]
fn start_after_stop_is_ignored() {
    init_logging();
    let (run, _) = update(ScanRun::new("http://example.com"), Msg::StopRequested);
    let (run, effects) = update(run, Msg::Started);
    assert_eq!(run.state(), ScanState::Stopped);
    assert!(effects.is_empty());
}

#[test]
fn reset_returns_finished_run_to_idle() {
    init_logging();
    let (run, _) = update(
        running(),
        Msg::Crawler(CrawlerEvent::Progress {
            percent: 50,
            crawled: 4,
            remaining: 4,
        }),
    );
    let (run, _) = update(run, Msg::Crawler(CrawlerEvent::Completed { successful: true }));

    let (run, effects) = update(run, Msg::ResetRequested);
    assert_eq!(effects, vec![Effect::ClearResults, Effect::ReleaseCrawler]);
    assert_eq!(run, ScanRun::new("http://example.com"));
}

#[test]
fn reset_is_refused_while_active() {
    init_logging();
    let (run, effects) = update(running(), Msg::ResetRequested);
    assert_eq!(run.state(), ScanState::Running);
    assert!(effects.is_empty());
}
