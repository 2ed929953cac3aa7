use std::path::PathBuf;

/// Process-level settings for a harvest run, read from the environment.
///
/// Per-store behaviour (selectors, pacing, pagination) lives in the stores
/// file instead; see [`crate::stores`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub stores_path: PathBuf,
    pub output_dir: PathBuf,
    /// Base URL of the WebDriver server (chromedriver, geckodriver, Selenium).
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    /// Overall wall-clock budget for one harvest. `0` disables the deadline.
    pub run_timeout_secs: u64,
    /// How long the seed page may take to expose a `body` element.
    pub ready_timeout_secs: u64,
}

impl AppConfig {
    /// Returns the run deadline as a duration, or `None` when unbounded.
    #[must_use]
    pub fn run_timeout(&self) -> Option<std::time::Duration> {
        (self.run_timeout_secs > 0).then(|| std::time::Duration::from_secs(self.run_timeout_secs))
    }
}
