//! JSON export of matched articles.
//!
//! Each crawl writes one file named after the moment it finished, so
//! repeated runs never overwrite each other.

use crate::models::ArticleRecord;
use crate::utils::{ensure_writable_dir, file_timestamp};
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Filename for results produced at `now`.
pub fn results_filename(now: DateTime<Local>) -> String {
    format!("news_results_{}.json", file_timestamp(now))
}

/// Write `records` as pretty JSON into `output_dir`.
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// Fails if the directory is not writable or the file cannot be written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), count = records.len()))]
pub async fn write_results(
    records: &[ArticleRecord],
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, Box<dyn Error>> {
    ensure_writable_dir(output_dir).await?;

    let json = serde_json::to_string_pretty(records)?;
    let path = output_dir.join(results_filename(now));

    info!(path = %path.display(), "Writing JSON");
    if let Err(e) = fs::write(&path, json).await {
        error!(path = %path.display(), error = %e, "Failed to write results");
        return Err(e.into());
    }
    info!(path = %path.display(), "Wrote results file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> ArticleRecord {
        ArticleRecord {
            source: "Test".to_string(),
            title: "Warming".to_string(),
            text: "climate change accelerates".to_string(),
            url: "http://a.example/article/1".to_string(),
            keywords: String::new(),
            publish_date: None,
            matched_tags: vec!["climate".to_string()],
        }
    }

    #[test]
    fn test_results_filename() {
        let now = Local.with_ymd_and_hms(2025, 5, 6, 8, 30, 0).unwrap();
        assert_eq!(results_filename(now), "news_results_20250506_083000.json");
    }

    #[tokio::test]
    async fn test_write_results_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2025, 5, 6, 8, 30, 0).unwrap();
        let path = write_results(&[record()], tmp.path(), now).await.unwrap();

        assert_eq!(path, tmp.path().join("news_results_20250506_083000.json"));
        let raw = std::fs::read_to_string(&path).unwrap();
        let back: Vec<ArticleRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, vec![record()]);
    }

    #[tokio::test]
    async fn test_write_empty_results() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_results(&[], tmp.path(), Local::now()).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }
}
