//! Chromium-backed browsing session using chromiumoxide.

use super::{BrowsingSession, NavigationSignals, PageMargins, PendingDownload, Signal};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLoadEventFired, NavigateParams, PrintToPdfParams,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use futures::{FutureExt, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Chromium aborts the navigation itself when a response becomes a
/// download; that is not a failure here.
const DOWNLOAD_ABORT: &str = "net::ERR_ABORTED";

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. explicit flag, then MANUAL_MIRROR_CHROMIUM_PATH
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }
    if let Ok(p) = std::env::var("MANUAL_MIRROR_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.manual-mirror/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".manual-mirror/chromium/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".manual-mirror/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".manual-mirror/chromium/chrome-linux64/chrome"),
                home.join(".manual-mirror/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// How to launch the browser.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub chromium: Option<PathBuf>,
    pub headful: bool,
}

/// A single Chromium tab used for a whole mirror run.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// Downloads land here (named by GUID) until saved.
    staging: PathBuf,
}

impl ChromiumSession {
    /// Launch Chromium and open one tab with downloads enabled.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let chrome_path = find_chromium(options.chromium.as_deref())
            .context("Chromium not found. Set MANUAL_MIRROR_CHROMIUM_PATH or pass --chromium.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        builder = if options.headful {
            builder.with_head()
        } else {
            builder.arg("--headless=new")
        };
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        let staging = std::env::temp_dir().join(format!("manual-mirror-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&staging)
            .await
            .with_context(|| format!("failed to create {}", staging.display()))?;

        let mut behavior = SetDownloadBehaviorParams::new(SetDownloadBehaviorBehavior::AllowAndName);
        behavior.download_path = Some(staging.display().to_string());
        behavior.events_enabled = Some(true);
        page.execute(behavior)
            .await
            .context("failed to enable downloads")?;

        Ok(Self {
            browser,
            page,
            handler,
            staging,
        })
    }

    /// Close the tab and browser and remove staged downloads.
    pub async fn close(mut self) -> Result<()> {
        let _ = self.page.close().await;
        if let Err(e) = self.browser.close().await {
            warn!("failed to close Chromium cleanly: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&self.staging).await {
            debug!("failed to remove {}: {e}", self.staging.display());
        }
        Ok(())
    }

    async fn arm_download(&self) -> Result<Signal<Box<dyn PendingDownload>>> {
        let mut begins = Box::pin(
            self.page
                .event_listener::<EventDownloadWillBegin>()
                .await
                .context("failed to subscribe to downloads")?,
        );
        let progress = Box::pin(
            self.page
                .event_listener::<EventDownloadProgress>()
                .await
                .context("failed to subscribe to download progress")?,
        );
        let staging = self.staging.clone();

        Ok(async move {
            let begin = begins
                .next()
                .await
                .context("download event stream closed")?;
            debug!("download started: {} ({})", begin.suggested_filename, begin.url);
            let download: Box<dyn PendingDownload> = Box::new(ChromiumDownload {
                guid: begin.guid.clone(),
                suggested_filename: begin.suggested_filename.clone(),
                staged: staging.join(&begin.guid),
                progress,
            });
            Ok::<_, anyhow::Error>(download)
        }
        .boxed())
    }

    async fn eval_string(&self, script: &str) -> Result<String> {
        self.page
            .evaluate(script)
            .await
            .with_context(|| format!("failed to evaluate {script}"))?
            .into_value::<String>()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }
}

#[async_trait]
impl BrowsingSession for ChromiumSession {
    async fn watch_navigation(&mut self) -> Result<NavigationSignals> {
        let mut loads = Box::pin(
            self.page
                .event_listener::<EventLoadEventFired>()
                .await
                .context("failed to subscribe to load events")?,
        );
        let download = self.arm_download().await?;
        let load = async move {
            loads
                .next()
                .await
                .map(|_| ())
                .context("load event stream closed")
        }
        .boxed();
        Ok(NavigationSignals { load, download })
    }

    async fn watch_download(&mut self) -> Result<Signal<Box<dyn PendingDownload>>> {
        self.arm_download().await
    }

    async fn commit(&mut self, url: &str) -> Result<()> {
        let resp = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .with_context(|| format!("failed to navigate to {url}"))?;
        match resp.result.error_text.as_deref() {
            None => Ok(()),
            Some(DOWNLOAD_ABORT) => {
                debug!("navigation to {url} became a download");
                Ok(())
            }
            Some(err) => bail!("navigation to {url} failed: {err}"),
        }
    }

    async fn current_url(&self) -> Result<String> {
        self.eval_string("document.URL").await
    }

    async fn content_type(&self) -> Result<String> {
        self.eval_string("document.contentType").await
    }

    async fn remove_element(&self, selector: &str) -> Result<()> {
        let selector = serde_json::to_string(selector)?;
        self.page
            .evaluate(format!("document.querySelector({selector})?.remove()"))
            .await
            .context("failed to remove element")?;
        Ok(())
    }

    async fn print_pdf(&self, path: &Path, margins: PageMargins) -> Result<()> {
        let params = PrintToPdfParams {
            margin_top: Some(margins.top),
            margin_right: Some(margins.right),
            margin_bottom: Some(margins.bottom),
            margin_left: Some(margins.left),
            print_background: Some(true),
            ..Default::default()
        };
        let pdf = self.page.pdf(params).await.context("failed to print page")?;
        tokio::fs::write(path, pdf)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

struct ChromiumDownload {
    guid: String,
    suggested_filename: String,
    staged: PathBuf,
    progress: Pin<Box<EventStream<EventDownloadProgress>>>,
}

#[async_trait]
impl PendingDownload for ChromiumDownload {
    fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    async fn save_as(mut self: Box<Self>, path: &Path) -> Result<()> {
        loop {
            let event = self
                .progress
                .next()
                .await
                .context("download progress stream closed")?;
            if event.guid != self.guid {
                continue;
            }
            match event.state {
                DownloadProgressState::Completed => break,
                DownloadProgressState::Canceled => {
                    bail!("download of {} was canceled", self.suggested_filename)
                }
                DownloadProgressState::InProgress => {}
            }
        }

        if tokio::fs::rename(&self.staged, path).await.is_err() {
            // staging dir may sit on another filesystem
            tokio::fs::copy(&self.staged, path)
                .await
                .with_context(|| format!("failed to copy download to {}", path.display()))?;
            let _ = tokio::fs::remove_file(&self.staged).await;
        }
        Ok(())
    }
}
