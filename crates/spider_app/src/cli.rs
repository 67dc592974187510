use std::path::PathBuf;

use clap::Parser;
use spider_core::{ScanContext, ScanOptions};
use spider_engine::CrawlSettings;

use crate::logging::LogDestination;

/// Crawl a site from its start page and list every URI the spider finds.
#[derive(Parser, Debug)]
#[command(name = "spider", version)]
pub struct Cli {
    /// Start page of the scan, e.g. https://example.com/docs/
    pub url: String,

    /// Seed from every page in scope instead of the start page alone.
    #[arg(long)]
    pub scope: bool,

    /// Restrict a scope-wide scan to URIs under these prefixes.
    #[arg(long, value_name = "PREFIX", requires = "scope")]
    pub context: Vec<String>,

    /// Also seed the pages below the start page.
    #[arg(long)]
    pub recurse: bool,

    /// Regular expression for URIs the spider must not fetch. Repeatable.
    #[arg(long, value_name = "REGEX")]
    pub exclude: Vec<String>,

    /// How many links away from a seed the spider follows.
    #[arg(long, default_value_t = 5)]
    pub max_depth: usize,

    #[arg(long, default_value_t = 1000)]
    pub max_pages: usize,

    /// Concurrent requests.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Write the results to this RON file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,
}

impl Cli {
    pub fn scan_options(&self) -> ScanOptions {
        let context = (!self.context.is_empty()).then(|| {
            self.context
                .iter()
                .fold(ScanContext::new("command line"), |context, prefix| {
                    context.with_prefix(prefix.as_str())
                })
        });
        ScanOptions {
            scan_entire_scope: self.scope,
            recurse_children: self.recurse,
            context,
            exclude: self.exclude.clone(),
        }
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            max_concurrency: self.concurrency,
            ..CrawlSettings::default()
        }
    }
}
