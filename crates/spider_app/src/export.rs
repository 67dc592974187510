//! RON export of a finished scan.
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use spider_core::{DiscoveryRecord, ScanView};
use spider_logging::spider_info;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedScan {
    pub site: String,
    pub exported_utc: String,
    pub state: String,
    pub completed_successfully: Option<bool>,
    pub crawled: u32,
    pub records: Vec<ExportedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRecord {
    pub uri: String,
    pub method: String,
    pub status: Option<String>,
    pub error: bool,
}

impl ExportedScan {
    pub fn new(view: &ScanView, records: &[DiscoveryRecord]) -> Self {
        Self {
            site: view.site.clone(),
            exported_utc: Utc::now().to_rfc3339(),
            state: format!("{:?}", view.state),
            completed_successfully: view.completion,
            crawled: view.crawled,
            records: records
                .iter()
                .map(|record| ExportedRecord {
                    uri: record.uri.clone(),
                    method: record.method.clone(),
                    status: record.status_tag.clone(),
                    error: record.is_error,
                })
                .collect(),
        }
    }
}

/// Writes the scan to `path` via a temp file in the same directory, then renames it.
pub fn write_results(path: &Path, scan: &ExportedScan) -> anyhow::Result<()> {
    let content = ron::ser::to_string_pretty(scan, ron::ser::PrettyConfig::new())
        .context("serializing scan results")?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("writing {}", path.display()))?;

    spider_info!("Wrote {} results to {}", scan.records.len(), path.display());
    Ok(())
}
