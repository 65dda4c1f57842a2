use crate::config::BrowserConfig;
use crate::error::IngestError;
use log::{debug, warn};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Well-known install locations, checked in order
const CANDIDATES: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/opt/homebrew/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// Renders pages with a local headless Chromium and returns the final DOM
pub struct ChromeFetcher {
    binary: PathBuf,
    timeout: Duration,
    attempts: u32,
}

impl ChromeFetcher {
    /// Locate a browser binary.
    ///
    /// An explicitly configured binary is authoritative: if it does not exist
    /// no other location is tried. Otherwise `CHROMIUM_BIN`, then the
    /// well-known install paths.
    pub fn locate(config: &BrowserConfig) -> Option<PathBuf> {
        if let Some(binary) = &config.binary {
            return binary.is_file().then(|| binary.clone());
        }

        if let Ok(custom) = env::var("CHROMIUM_BIN") {
            let custom = PathBuf::from(custom);
            if custom.is_file() {
                return Some(custom);
            }
        }

        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|candidate| candidate.is_file())
            .map(Path::to_path_buf)
    }

    pub fn from_config(config: &BrowserConfig) -> Result<Self, IngestError> {
        let binary = Self::locate(config).ok_or(IngestError::BrowserUnavailable)?;
        Ok(Self {
            binary,
            timeout: Duration::from_secs(config.timeout),
            attempts: config.attempts.max(1),
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Render `url`, retrying with a fresh browser profile on failure.
    pub async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.render_once(url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    warn!(
                        "Render attempt {}/{} for {} failed: {}",
                        attempt, self.attempts, url, e
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| IngestError::Render("no render attempts made".into())))
    }

    async fn render_once(&self, url: &str) -> Result<String, IngestError> {
        // Fresh profile per attempt so no state leaks between pages
        let profile = tempfile::tempdir()?;

        let child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-first-run")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg("--dump-dom")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| IngestError::Render(format!("launch browser: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                IngestError::Render(format!(
                    "page navigation timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().last().unwrap_or("").trim().to_string();
            return Err(IngestError::Render(format!(
                "browser exited with {}: {}",
                output.status, reason
            )));
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return Err(IngestError::Render("browser returned an empty document".into()));
        }
        debug!("Rendered {} ({} bytes)", url, html.len());
        Ok(html)
    }
}
