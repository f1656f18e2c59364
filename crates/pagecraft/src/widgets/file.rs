//! File uploads and downloads.
//!
//! Downloads are observed on disk: the download directory is polled until
//! the expected file shows up complete. Browser partial files
//! (`.crdownload`, `.part`, `.tmp`) never count as downloaded.

use crate::config::Config;
use crate::driver::BrowserDriver;
use crate::element::{Capabilities, Element, ElementKind};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::wait::{ElementCondition, WaitOptions, Waiter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default time allowed for a download (30s)
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between download directory scans
pub const DOWNLOAD_POLL_INTERVAL: Duration = Duration::from_millis(500);

const PARTIAL_EXTENSIONS: [&str; 3] = ["crdownload", "part", "tmp"];

/// Whether `name` is a browser's in-progress download file
#[must_use]
pub fn is_partial(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PARTIAL_EXTENSIONS.contains(&e))
}

// =============================================================================
// Upload
// =============================================================================

async fn resolve_upload(path: &Path) -> PageResult<PathBuf> {
    match tokio::fs::canonicalize(path).await {
        Ok(absolute) if absolute.is_file() => Ok(absolute),
        _ => Err(PageError::invalid_argument(format!(
            "file not found: {}",
            path.display()
        ))),
    }
}

/// Attach every file in `paths` to a file input
///
/// # Errors
///
/// [`PageError::InvalidArgument`] when any file does not exist; nothing is
/// attached in that case.
pub async fn upload_files<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    paths: &[&Path],
) -> PageResult<()> {
    element.require(Capabilities::FILES)?;
    let mut resolved = Vec::with_capacity(paths.len());
    for path in paths {
        resolved.push(resolve_upload(path).await?);
    }
    info!(element = element.name(), files = resolved.len(), "Uploading files");
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    let files = resolved.as_slice();
    element
        .perform(session, "upload_files", Some(ElementCondition::Exists), move || {
            driver.upload_files(ctx, selector, files)
        })
        .await
}

/// Attach one file
pub async fn upload_file<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    path: &Path,
) -> PageResult<()> {
    upload_files(session, element, &[path]).await
}

/// Name of the attached file as the input reports it; empty when none
pub async fn uploaded_file_name<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<String> {
    element.require(Capabilities::FILES)?;
    let value = element.get_value(session).await?;
    Ok(value
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or_default()
        .to_string())
}

// =============================================================================
// Download
// =============================================================================

async fn complete_files(directory: &Path) -> HashSet<String> {
    let mut names = HashSet::new();
    let Ok(mut entries) = tokio::fs::read_dir(directory).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_partial(&name) {
            names.insert(name);
        }
    }
    names
}

async fn is_downloaded(directory: &Path, name: &str) -> bool {
    if is_partial(name) {
        return false;
    }
    let path = directory.join(name);
    let partial = PARTIAL_EXTENSIONS
        .iter()
        .map(|ext| directory.join(format!("{name}.{ext}")));
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return false;
    }
    for candidate in partial {
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return false;
        }
    }
    true
}

/// Control that downloads a file into a known directory
#[derive(Debug, Clone)]
pub struct FileDownload {
    button: Element,
    directory: PathBuf,
    timeout: Duration,
}

impl FileDownload {
    /// Download control saving into `directory`
    #[must_use]
    pub fn new(locator: &str, name: &str, directory: impl Into<PathBuf>) -> Self {
        Self {
            button: Element::of_kind(ElementKind::FileDownload, locator, name),
            directory: directory.into(),
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Download control saving into the configured `downloadDir`
    #[must_use]
    pub fn from_config(locator: &str, name: &str, config: &Config) -> Self {
        Self::new(locator, name, config.download_dir())
    }

    /// Time allowed for a download
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Download directory
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where a file of this name lands
    #[must_use]
    pub fn downloaded_file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn waiter(&self) -> Waiter {
        Waiter::new(
            WaitOptions::new()
                .with_timeout(self.timeout)
                .with_poll_interval(DOWNLOAD_POLL_INTERVAL),
        )
    }

    /// Remove any old copy, click, then wait for `expected` to finish
    ///
    /// # Errors
    ///
    /// [`PageError::Download`] when the file is not complete within the
    /// timeout.
    pub async fn download<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        expected: &str,
    ) -> PageResult<PathBuf> {
        let target = self.downloaded_file_path(expected);
        match tokio::fs::remove_file(&target).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        tokio::fs::create_dir_all(&self.directory).await?;
        self.button.click(session).await?;
        if self.wait_for_download(expected).await {
            info!(element = self.button.name(), file = %target.display(), "Download finished");
            Ok(target)
        } else {
            Err(PageError::Download {
                message: format!(
                    "{expected} did not appear in {} within {}ms",
                    self.directory.display(),
                    self.timeout.as_millis()
                ),
            })
        }
    }

    /// Click, then wait for a new complete file whose name satisfies `matches`
    pub async fn download_matching<D, F>(
        &self,
        session: &Session<D>,
        matches: F,
    ) -> PageResult<PathBuf>
    where
        D: BrowserDriver,
        F: Fn(&str) -> bool,
    {
        tokio::fs::create_dir_all(&self.directory).await?;
        let before = complete_files(&self.directory).await;
        self.button.click(session).await?;
        let directory = self.directory.as_path();
        let (before, matches) = (&before, &matches);
        let found = self
            .waiter()
            .until_some(move || async move {
                complete_files(directory)
                    .await
                    .into_iter()
                    .find(|name| !before.contains(name) && matches(name))
            })
            .await;
        match found {
            Ok((_, name)) => {
                info!(element = self.button.name(), file = %name, "Download finished");
                Ok(self.downloaded_file_path(&name))
            }
            Err(elapsed) => Err(PageError::Download {
                message: format!(
                    "no matching file appeared in {} within {}ms",
                    self.directory.display(),
                    elapsed.as_millis()
                ),
            }),
        }
    }

    /// Whether `name` finishes downloading within the timeout
    pub async fn wait_for_download(&self, name: &str) -> bool {
        let directory = self.directory.as_path();
        let result = self
            .waiter()
            .until(format!("download of {name}"), move || {
                is_downloaded(directory, name)
            })
            .await;
        if !result.success {
            warn!(element = self.button.name(), file = name, "Download not complete");
        }
        result.success
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement};

    #[test]
    fn test_partial_names() {
        assert!(is_partial("report.pdf.crdownload"));
        assert!(is_partial("x.part"));
        assert!(!is_partial("report.pdf"));
    }

    mod upload_tests {
        use super::*;

        #[tokio::test]
        async fn test_upload_reports_file_name() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("passport.png");
            std::fs::write(&file, b"png").unwrap();
            let s = Session::new(
                MockDriver::new().with_element(MockElement::new("#file-upload").input("file")),
            );
            let input = Element::file_upload("#file-upload", "Upload");
            upload_file(&s, &input, &file).await.unwrap();
            assert_eq!(uploaded_file_name(&s, &input).await.unwrap(), "passport.png");
            assert_eq!(s.driver().uploaded_files("#file-upload"), vec!["passport.png"]);
        }

        #[tokio::test]
        async fn test_missing_file_is_rejected_before_driver() {
            let s = Session::new(
                MockDriver::new().with_element(MockElement::new("#file-upload").input("file")),
            );
            let input = Element::file_upload("#file-upload", "Upload");
            let err = upload_file(&s, &input, Path::new("/no/such/file.txt"))
                .await
                .unwrap_err();
            assert!(matches!(err, PageError::InvalidArgument { .. }));
            assert!(!s.driver().was_called("upload_files"));
        }
    }

    mod download_tests {
        use super::*;

        fn session(dir: &Path, name: &str) -> Session<MockDriver> {
            Session::new(MockDriver::new().with_element(
                MockElement::new("a.export").tag("a").on_click(MockEffect::WriteFile {
                    path: dir.join(name),
                    contents: b"id,price\n1,42\n".to_vec(),
                }),
            ))
        }

        #[tokio::test]
        async fn test_download_expected_file() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("prices.csv"), b"stale").unwrap();
            let s = session(dir.path(), "prices.csv");
            let control = FileDownload::new("a.export", "Export", dir.path());
            let path = control.download(&s, "prices.csv").await.unwrap();
            assert_eq!(std::fs::read(path).unwrap(), b"id,price\n1,42\n");
        }

        #[tokio::test]
        async fn test_download_matching_ignores_existing() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("old.csv"), b"old").unwrap();
            let s = session(dir.path(), "new.csv");
            let control = FileDownload::new("a.export", "Export", dir.path());
            let path = control
                .download_matching(&s, |name| name.ends_with(".csv"))
                .await
                .unwrap();
            assert_eq!(path.file_name().unwrap(), "new.csv");
        }

        #[tokio::test(start_paused = true)]
        async fn test_partial_download_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let s = session(dir.path(), "big.zip.crdownload");
            let control = FileDownload::new("a.export", "Export", dir.path())
                .with_timeout(Duration::from_secs(2));
            let err = control.download(&s, "big.zip").await.unwrap_err();
            assert!(matches!(err, PageError::Download { .. }));
        }
    }
}
