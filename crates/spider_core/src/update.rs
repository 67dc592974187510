use crate::{CrawlerEvent, DiscoveryRecord, Effect, Msg, ScanRun, ScanState};

/// Pure update function: applies a message to a scan run and returns the effects to execute.
pub fn update(mut run: ScanRun, msg: Msg) -> (ScanRun, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            if run.state() == ScanState::Idle {
                run.set_state(ScanState::Running);
                vec![Effect::StartCrawler]
            } else {
                Vec::new()
            }
        }
        Msg::PauseRequested => {
            if run.state() == ScanState::Running {
                run.set_state(ScanState::Paused);
                vec![Effect::PauseCrawler]
            } else {
                Vec::new()
            }
        }
        Msg::ResumeRequested => {
            if run.state() == ScanState::Paused {
                run.set_state(ScanState::Running);
                vec![Effect::ResumeCrawler]
            } else {
                Vec::new()
            }
        }
        Msg::StopRequested => {
            if run.state().is_terminal() {
                Vec::new()
            } else {
                run.set_state(ScanState::Stopped);
                vec![Effect::StopCrawler, Effect::NotifyFinished]
            }
        }
        Msg::ResetRequested => {
            if run.state().is_active() {
                Vec::new()
            } else {
                run.reset();
                vec![Effect::ClearResults, Effect::ReleaseCrawler]
            }
        }
        Msg::Crawler(event) => {
            // Nothing is processed before the run starts or after it ends.
            if !run.state().is_active() {
                return (run, Vec::new());
            }
            apply_crawler_event(&mut run, event)
        }
    };

    (run, effects)
}

fn apply_crawler_event(run: &mut ScanRun, event: CrawlerEvent) -> Vec<Effect> {
    let mut effects = match &event {
        CrawlerEvent::Progress {
            percent,
            crawled,
            remaining,
        } => {
            // Last write wins: the crawler is monotonic overall but not across threads.
            run.apply_progress(*percent, *crawled, *remaining);
            vec![Effect::ReportProgress {
                done: run.crawled(),
                total: run.maximum(),
            }]
        }
        CrawlerEvent::UriFound {
            uri,
            method,
            status,
        } => {
            let record = DiscoveryRecord::classify(uri.as_str(), method.as_str(), *status);
            let found = run.bump_found();
            vec![
                Effect::RecordDiscovery(record),
                Effect::FoundCountChanged(found),
            ]
        }
        CrawlerEvent::UriRead(message) => vec![Effect::PersistMessage(message.clone())],
        CrawlerEvent::Completed { successful } => {
            run.complete(*successful);
            vec![Effect::NotifyFinished]
        }
    };
    effects.push(Effect::ForwardEvent(event));
    effects
}
