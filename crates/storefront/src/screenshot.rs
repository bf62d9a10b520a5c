//! Timestamped screenshots.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::driver::BrowserDriver;
use crate::error::{E2eError, E2eResult};

/// `<name>-<timestamp>.png` with `:` and `.` in the timestamp replaced by `-`
#[must_use]
pub fn screenshot_file_name(name: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let name: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{name}-{stamp}.png")
}

/// Capture the page into `dir`.
///
/// Returns `None` (after a warning) when the page is already closed.
pub async fn capture(
    driver: &dyn BrowserDriver,
    dir: &Path,
    name: &str,
    full_page: bool,
) -> E2eResult<Option<PathBuf>> {
    if driver.is_closed() {
        tracing::warn!(name, "page is closed, skipping screenshot");
        return Ok(None);
    }
    let bytes = driver.screenshot(full_page).await?;
    if bytes.is_empty() {
        return Err(E2eError::Screenshot {
            message: format!("empty capture for '{name}'"),
        });
    }
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(screenshot_file_name(name, Utc::now()));
    tokio::fs::write(&path, &bytes).await?;
    tracing::info!(path = %path.display(), "screenshot saved");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStorefront;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap();
        assert_eq!(
            screenshot_file_name("TC2-Step8-NavigatedToCart", at),
            "TC2-Step8-NavigatedToCart-2026-10-18T09-05-07-000Z.png"
        );
    }

    #[test]
    fn test_file_name_strips_separators() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(screenshot_file_name("a/b", at).starts_with("a_b-"));
    }

    #[tokio::test]
    async fn test_capture_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let site = MockStorefront::new();
        site.open_home();
        let path = capture(&site, dir.path(), "home", true).await.unwrap().unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[tokio::test]
    async fn test_capture_skipped_when_closed() {
        let dir = tempfile::tempdir().unwrap();
        let site = MockStorefront::new();
        site.close();
        assert!(capture(&site, dir.path(), "gone", false).await.unwrap().is_none());
    }
}
