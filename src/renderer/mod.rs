// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

//! Browsing-session abstraction.
//!
//! Defines the `BrowsingSession` and `PendingDownload` traits the page
//! acquirer drives, independent of the browser engine (currently Chromium
//! via chromiumoxide).

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::path::Path;

/// A one-shot page signal armed before navigation.
///
/// Resolves when the event fires, or fails if its event source closes.
/// Dropping the future unsubscribes.
pub type Signal<T> = BoxFuture<'static, Result<T>>;

/// The two signals raced after each navigation.
pub struct NavigationSignals {
    /// The page's load event.
    pub load: Signal<()>,
    /// A native download started by the navigation.
    pub download: Signal<Box<dyn PendingDownload>>,
}

/// A download the browser has started but that has not been persisted.
#[async_trait]
pub trait PendingDownload: Send {
    /// Filename suggested by the server.
    fn suggested_filename(&self) -> &str;
    /// Wait for the download to finish and move its payload to `path`.
    async fn save_as(self: Box<Self>, path: &Path) -> Result<()>;
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PageMargins {
    pub fn uniform(inches: f64) -> Self {
        Self {
            top: inches,
            right: inches,
            bottom: inches,
            left: inches,
        }
    }

    /// One CSS pixel (1/96 in) on every side.
    pub fn hairline() -> Self {
        Self::uniform(1.0 / 96.0)
    }
}

/// A single stateful browsing context (tab).
///
/// Navigation mutates shared state, so callers drive it strictly
/// sequentially through `&mut self`.
#[async_trait]
pub trait BrowsingSession: Send + Sync {
    /// Arm load + download signals for the next navigation.
    async fn watch_navigation(&mut self) -> Result<NavigationSignals>;
    /// Arm a download signal alone.
    async fn watch_download(&mut self) -> Result<Signal<Box<dyn PendingDownload>>>;
    /// Navigate to `url`, returning once the browser commits.
    async fn commit(&mut self, url: &str) -> Result<()>;
    /// URL of the current document, after redirects.
    async fn current_url(&self) -> Result<String>;
    /// `document.contentType` of the current document.
    async fn content_type(&self) -> Result<String>;
    /// Remove the first element matching `selector`, if any.
    async fn remove_element(&self, selector: &str) -> Result<()>;
    /// Print the current page to a PDF file.
    async fn print_pdf(&self, path: &Path, margins: PageMargins) -> Result<()>;
}
