mod cli;
mod export;
mod logging;
mod reporter;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use spider_core::{DiscoveryRecord, HistoryType, HttpMessage};
use spider_engine::{
    FetchSettings, Fetcher, HttpCrawlerFactory, MemorySiteTree, ReqwestFetcher, ScanController,
};
use spider_logging::spider_info;
use url::Url;

use crate::cli::Cli;
use crate::export::ExportedScan;
use crate::reporter::ProgressReporter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log);

    let start_url =
        Url::parse(&cli.url).with_context(|| format!("invalid start URL {:?}", cli.url))?;
    let site = start_url.origin().ascii_serialization();
    let settings = cli.crawl_settings();

    // The spider seeds from pages already in the site tree, so the start page goes in first.
    let tree = Arc::new(MemorySiteTree::scoped_to(vec![site.clone()]));
    let start_page = fetch_start_page(&start_url, &settings.fetch)?;
    let start_node = tree
        .record(HistoryType::Proxied, &start_page)
        .context("recording the start page")?;
    spider_info!(
        "Start page {} answered {}",
        start_url,
        start_page.response.status
    );

    let controller = ScanController::new(
        site.clone(),
        cli.scan_options(),
        tree,
        Arc::new(HttpCrawlerFactory::new(settings)),
    )
    .with_owner(Arc::new(ProgressReporter::new()))
    .with_start_node(start_node);

    let view = controller.run()?;
    let records = controller.results().snapshot();
    print_records(&records);
    println!(
        "{}: {:?}, {} pages fetched, {} URIs found",
        view.site, view.state, view.crawled, view.found
    );

    if let Some(path) = &cli.output {
        export::write_results(path, &ExportedScan::new(&view, &records))?;
    }
    Ok(())
}

fn fetch_start_page(uri: &Url, settings: &FetchSettings) -> anyhow::Result<HttpMessage> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building the fetch runtime")?;
    let fetcher = ReqwestFetcher::new(settings.clone());
    let page = runtime
        .block_on(fetcher.fetch(uri))
        .with_context(|| format!("fetching start page {uri}"))?;
    Ok(page)
}

fn print_records(records: &[DiscoveryRecord]) {
    for record in records {
        let status = record.status_tag.as_deref().unwrap_or("");
        let marker = if record.is_error { "!" } else { " " };
        println!("{marker} {status:<16} {:<6} {}", record.method, record.uri);
    }
}
