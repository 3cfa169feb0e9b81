//! Configuration for ingestion, analysis and report export.
//!
//! All behaviour is controlled through [`TriageConfig`], built via its
//! [`TriageConfigBuilder`]. Setters clamp obviously out-of-range values;
//! [`TriageConfigBuilder::build`] rejects the ones that cannot be clamped.

use crate::error::TriageError;
use crate::progress::ProgressCallback;
use crate::report::ReportLayout;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Upper bound for the commit smoothing delay.
const MAX_COMMIT_DELAY_MS: u64 = 10_000;

/// Configuration for a triage session.
///
/// # Example
/// ```rust
/// use mail_triage::TriageConfig;
///
/// let config = TriageConfig::builder()
///     .commit_delay_ms(250)
///     .backend_url("http://localhost:8080/api")
///     .build()
///     .unwrap();
/// assert_eq!(config.commit_delay().as_millis(), 250);
/// ```
#[derive(Clone)]
pub struct TriageConfig {
    /// Delay between a successful file extraction and its commit to the
    /// document buffer, in milliseconds. Default: 1000.
    ///
    /// Keeps the busy indicator visible long enough to avoid flicker on
    /// small files. A `clear()` or newer submission cancels it.
    pub commit_delay_ms: u64,

    /// Analysis endpoint receiving `{ "email": <text> }`.
    /// Default: `http://127.0.0.1:5001/api`.
    pub backend_url: String,

    /// Per-request timeout for the analysis call in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Path to the pdfium library (file, or directory holding the
    /// platform-named library). Falls back to `PDFIUM_LIB_PATH`, then to
    /// the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Page geometry and typography of exported reports.
    pub layout: ReportLayout,

    /// Optional observer for ingestion events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            commit_delay_ms: 1000,
            backend_url: "http://127.0.0.1:5001/api".to_string(),
            request_timeout_secs: 60,
            pdfium_library_path: None,
            layout: ReportLayout::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TriageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriageConfig")
            .field("commit_delay_ms", &self.commit_delay_ms)
            .field("backend_url", &self.backend_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("layout", &self.layout)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn IngestionProgressCallback>"),
            )
            .finish()
    }
}

impl TriageConfig {
    /// Create a new builder for `TriageConfig`.
    pub fn builder() -> TriageConfigBuilder {
        TriageConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The pdfium library to bind: explicit path first, then the
    /// `PDFIUM_LIB_PATH` environment variable.
    pub fn resolved_pdfium_path(&self) -> Option<PathBuf> {
        self.pdfium_library_path.clone().or_else(|| {
            std::env::var(PDFIUM_LIB_PATH_ENV)
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        })
    }
}

/// Builder for [`TriageConfig`].
#[derive(Debug)]
pub struct TriageConfigBuilder {
    config: TriageConfig,
}

impl TriageConfigBuilder {
    pub fn commit_delay_ms(mut self, ms: u64) -> Self {
        self.config.commit_delay_ms = ms.min(MAX_COMMIT_DELAY_MS);
        self
    }

    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn layout(mut self, layout: ReportLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TriageConfig, TriageError> {
        let c = &self.config;
        if !(c.backend_url.starts_with("http://") || c.backend_url.starts_with("https://")) {
            return Err(TriageError::InvalidConfig(format!(
                "backend URL must be http:// or https://, got '{}'",
                c.backend_url
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(TriageError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TriageConfig::default();
        assert_eq!(c.commit_delay(), Duration::from_secs(1));
        assert_eq!(c.request_timeout_secs, 60);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn commit_delay_is_clamped() {
        let c = TriageConfig::builder()
            .commit_delay_ms(60_000)
            .build()
            .unwrap();
        assert_eq!(c.commit_delay_ms, MAX_COMMIT_DELAY_MS);
    }

    #[test]
    fn rejects_non_http_backend() {
        let err = TriageConfig::builder()
            .backend_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(TriageConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn explicit_pdfium_path_wins() {
        let c = TriageConfig::builder()
            .pdfium_library_path("/opt/pdfium/lib")
            .build()
            .unwrap();
        assert_eq!(
            c.resolved_pdfium_path(),
            Some(PathBuf::from("/opt/pdfium/lib"))
        );
    }

    #[test]
    fn debug_hides_callback() {
        let c = TriageConfig::default();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("commit_delay_ms"));
    }
}
