// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page acquisition: turn one remote reference into one local PDF.
//!
//! The content service answers a document reference in one of three ways:
//! an inline PDF (the browser fires a native download), an HTML viewer
//! that redirects to the raw PDF, or an HTML page meant to be read as-is.
//! Which signal fires first (load or download) does not reliably say which
//! case occurred. The final resolved URL is the discriminator:
//!
//! 1. Resolved URL ends in `.pdf`: navigate there again and save the
//!    download it triggers.
//! 2. Otherwise, if the first navigation already triggered a download,
//!    save that one.
//! 3. Otherwise render the loaded page to PDF, minus its footer.
//!
//! The document's content type is logged but never consulted for the branch.

pub mod race;

use crate::error::{AcquisitionError, Stage};
use crate::renderer::{BrowsingSession, PageMargins, PendingDownload};
use async_trait::async_trait;
use race::{bounded, first_settled, Settled};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Extension identifying a direct document URL.
pub const DOCUMENT_EXTENSION: &str = ".pdf";

/// Non-content chrome stripped before rendering.
pub const FOOTER_SELECTOR: &str = ".footer";

/// How a leaf was materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// Resolved to a `.pdf` URL; fetched by a second navigation.
    Redirected { resolved_url: String },
    /// The first navigation produced the download directly.
    Downloaded { resolved_url: String },
    /// The page itself was printed to PDF.
    Rendered { resolved_url: String },
}

/// The branch chosen once signals have settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Redirect,
    Inline,
    Render,
}

/// Decide how to persist a leaf from its resolved URL and whether the
/// download signal won the race.
pub fn choose_branch(resolved_url: &str, download_won: bool) -> Branch {
    if is_document_url(resolved_url) {
        Branch::Redirect
    } else if download_won {
        Branch::Inline
    } else {
        Branch::Render
    }
}

/// Whether the URL's path ends with the document extension, ignoring
/// query, fragment and ASCII case.
pub fn is_document_url(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_ascii_lowercase().ends_with(DOCUMENT_EXTENSION)
}

/// Something that can persist one leaf. The tree walker drives this.
#[async_trait]
pub trait Acquire: Send {
    async fn acquire(&mut self, url: &Url, path: &Path) -> Result<Acquired, AcquisitionError>;
}

/// Acquisition knobs.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Bound on each suspension point. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub margins: PageMargins,
    pub footer_selector: String,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(120)),
            margins: PageMargins::hairline(),
            footer_selector: FOOTER_SELECTOR.to_string(),
        }
    }
}

/// Acquires leaves through a borrowed browsing session.
pub struct PageAcquirer<'s> {
    session: &'s mut dyn BrowsingSession,
    options: AcquireOptions,
}

fn at(stage: Stage) -> impl FnOnce(anyhow::Error) -> AcquisitionError {
    move |source| AcquisitionError::Session { stage, source }
}

impl<'s> PageAcquirer<'s> {
    pub fn new(session: &'s mut dyn BrowsingSession, options: AcquireOptions) -> Self {
        Self { session, options }
    }

    async fn follow_redirect(&mut self, resolved: &str, path: &Path) -> Result<(), AcquisitionError> {
        let limit = self.options.timeout;
        let download = self.session.watch_download().await.map_err(at(Stage::Arm))?;
        bounded(limit, Stage::Redirect, async {
            self.session.commit(resolved).await.map_err(at(Stage::Redirect))
        })
        .await?;
        let download = bounded(limit, Stage::Download, async {
            download.await.map_err(at(Stage::Download))
        })
        .await?;
        self.save(download, path).await
    }

    async fn save(&self, download: Box<dyn PendingDownload>, path: &Path) -> Result<(), AcquisitionError> {
        debug!(
            "saving download {} to {}",
            download.suggested_filename(),
            path.display()
        );
        bounded(self.options.timeout, Stage::Save, async {
            download.save_as(path).await.map_err(at(Stage::Save))
        })
        .await
    }

    async fn render(&self, path: &Path) -> Result<(), AcquisitionError> {
        let limit = self.options.timeout;
        bounded(limit, Stage::Render, async {
            self.session
                .remove_element(&self.options.footer_selector)
                .await
                .map_err(at(Stage::Render))?;
            self.session
                .print_pdf(path, self.options.margins)
                .await
                .map_err(at(Stage::Render))
        })
        .await
    }
}

#[async_trait]
impl Acquire for PageAcquirer<'_> {
    async fn acquire(&mut self, url: &Url, path: &Path) -> Result<Acquired, AcquisitionError> {
        let limit = self.options.timeout;

        let signals = self.session.watch_navigation().await.map_err(at(Stage::Arm))?;
        bounded(limit, Stage::Navigate, async {
            self.session.commit(url.as_str()).await.map_err(at(Stage::Navigate))
        })
        .await?;
        let settled = bounded(limit, Stage::Settle, first_settled(signals)).await?;

        let (resolved_url, content_type) = bounded(limit, Stage::Inspect, async {
            let resolved = self.session.current_url().await.map_err(at(Stage::Inspect))?;
            let content_type = self.session.content_type().await.map_err(at(Stage::Inspect))?;
            Ok::<_, AcquisitionError>((resolved, content_type))
        })
        .await?;
        info!("URL: {resolved_url}, type: {content_type}");

        let download = match settled {
            Settled::Downloaded(download) => Some(download),
            Settled::Loaded => None,
        };
        let branch = choose_branch(&resolved_url, download.is_some());
        debug!("{url}: {branch:?}");

        match (branch, download) {
            (Branch::Redirect, _) => {
                self.follow_redirect(&resolved_url, path).await?;
                Ok(Acquired::Redirected { resolved_url })
            }
            (Branch::Inline, Some(download)) => {
                self.save(download, path).await?;
                Ok(Acquired::Downloaded { resolved_url })
            }
            _ => {
                self.render(path).await?;
                Ok(Acquired::Rendered { resolved_url })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_detection() {
        assert!(is_document_url("https://host/docs/a.pdf"));
        assert!(is_document_url("https://host/docs/A.PDF?token=1#page=2"));
        assert!(!is_document_url("https://host/viewer.svc?file=a.pdf"));
        assert!(!is_document_url("https://host/docs/a.pdf.html"));
        assert!(is_document_url("/relative/a.pdf?x"));
    }

    #[test]
    fn test_branch_choice() {
        assert_eq!(choose_branch("https://h/a.pdf", false), Branch::Redirect);
        assert_eq!(choose_branch("https://h/a.pdf", true), Branch::Redirect);
        assert_eq!(choose_branch("https://h/view.svc", true), Branch::Inline);
        assert_eq!(choose_branch("https://h/view.svc", false), Branch::Render);
    }
}
