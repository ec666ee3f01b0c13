// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

//! Depth-first tree walker that mirrors a ToC onto the filesystem.
//!
//! Sections become directories, leaves become `<name>.pdf` files. The
//! walk is strictly sequential and follows the ToC's document order.
//!
//! Failure handling is asymmetric: a leaf that fails to
//! acquire is logged and skipped, while a directory that cannot be
//! created aborts the rest of its subtree and every enclosing level.

pub mod materialize;
pub mod sanitize;

use crate::acquisition::{Acquire, AcquireOptions, Acquired, PageAcquirer};
use crate::error::{AcquisitionError, WalkError};
use crate::renderer::BrowsingSession;
use crate::toc::{Children, TocNode};
use futures::future::BoxFuture;
use futures::FutureExt;
use materialize::{ensure_dir, Materialized};
use sanitize::{is_placeholder, sanitize};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use url::Url;

/// A leaf that could not be acquired.
#[derive(Debug, Clone)]
pub struct LeafFailure {
    pub name: String,
    pub path: PathBuf,
    pub error: String,
}

/// Tally of a finished walk.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub directories_created: usize,
    pub directories_existing: usize,
    pub redirected: usize,
    pub downloaded: usize,
    pub rendered: usize,
    pub failures: Vec<LeafFailure>,
}

impl WalkReport {
    /// Leaves written to disk.
    pub fn saved(&self) -> usize {
        self.redirected + self.downloaded + self.rendered
    }
}

/// Target file for a leaf named `name` inside `dir`.
pub fn leaf_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.pdf", sanitize(name)))
}

/// Resolve a leaf reference against the content service's base URL.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, AcquisitionError> {
    if is_placeholder(reference) {
        return Err(AcquisitionError::Placeholder(reference.to_string()));
    }
    base.join(reference.trim())
        .map_err(|source| AcquisitionError::InvalidReference {
            reference: reference.to_string(),
            source,
        })
}

/// Walks a ToC tree, delegating each leaf to an [`Acquire`] implementation.
pub struct Walker<A> {
    acquirer: A,
    base: Url,
}

impl<A: Acquire> Walker<A> {
    pub fn new(acquirer: A, base: Url) -> Self {
        Self { acquirer, base }
    }

    /// Mirror `tree` under `output_root`, which must already exist.
    pub async fn walk(&mut self, output_root: &Path, tree: &Children) -> Result<WalkReport, WalkError> {
        let mut report = WalkReport::default();
        self.walk_children(output_root, tree, &mut report).await?;
        Ok(report)
    }

    pub fn into_inner(self) -> A {
        self.acquirer
    }

    fn walk_children<'a>(
        &'a mut self,
        dir: &'a Path,
        children: &'a Children,
        report: &'a mut WalkReport,
    ) -> BoxFuture<'a, Result<(), WalkError>> {
        async move {
            for (name, node) in children.iter() {
                match node {
                    TocNode::Section(inner) => {
                        if is_placeholder(name) {
                            return Err(WalkError::MalformedNode {
                                name: name.to_string(),
                                parent: dir.to_path_buf(),
                            });
                        }
                        let sub = dir.join(sanitize(name));
                        match ensure_dir(&sub).await? {
                            Materialized::Created => report.directories_created += 1,
                            Materialized::Existing => report.directories_existing += 1,
                        }
                        self.walk_children(&sub, inner, report).await?;
                    }
                    TocNode::Leaf(reference) => {
                        self.walk_leaf(dir, name, reference, report).await;
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }

    async fn walk_leaf(&mut self, dir: &Path, name: &str, reference: &str, report: &mut WalkReport) {
        let path = leaf_path(dir, name);
        let result = match self.resolve(name, reference) {
            Ok(url) => {
                info!("Downloading page {}... (URL: {url})", sanitize(name));
                self.acquirer.acquire(&url, &path).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(Acquired::Redirected { .. }) => report.redirected += 1,
            Ok(Acquired::Downloaded { .. }) => report.downloaded += 1,
            Ok(Acquired::Rendered { .. }) => report.rendered += 1,
            Err(e) => {
                error!("Error saving page {name}: {e}");
                report.failures.push(LeafFailure {
                    name: name.to_string(),
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    fn resolve(&self, name: &str, reference: &str) -> Result<Url, AcquisitionError> {
        if is_placeholder(name) {
            return Err(AcquisitionError::Placeholder(name.to_string()));
        }
        resolve_reference(&self.base, reference)
    }
}

/// Mirror `tree` under `output_root` using `session` for every leaf.
pub async fn walk(
    session: &mut dyn BrowsingSession,
    base: Url,
    options: AcquireOptions,
    output_root: &Path,
    tree: &Children,
) -> Result<WalkReport, WalkError> {
    let acquirer = PageAcquirer::new(session, options);
    Walker::new(acquirer, base).walk(output_root, tree).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilesystemError;
    use async_trait::async_trait;

    /// Records every call and writes a stub file; fails for chosen URLs.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, PathBuf)>,
        fail_on: Vec<String>,
    }

    #[async_trait]
    impl Acquire for Recorder {
        async fn acquire(&mut self, url: &Url, path: &Path) -> Result<Acquired, AcquisitionError> {
            self.calls.push((url.path().to_string(), path.to_path_buf()));
            if self.fail_on.iter().any(|f| f == url.path()) {
                return Err(AcquisitionError::Session {
                    stage: crate::error::Stage::Navigate,
                    source: anyhow::anyhow!("boom"),
                });
            }
            tokio::fs::write(path, b"%PDF-stub").await.unwrap();
            Ok(Acquired::Rendered {
                resolved_url: url.to_string(),
            })
        }
    }

    fn base() -> Url {
        Url::parse("https://techinfo.example.com").unwrap()
    }

    #[test]
    fn test_resolve_reference() {
        let url = resolve_reference(&base(), "/doc1.svc").unwrap();
        assert_eq!(url.as_str(), "https://techinfo.example.com/doc1.svc");
        assert!(matches!(
            resolve_reference(&base(), "undefined"),
            Err(AcquisitionError::Placeholder(_))
        ));
        assert!(matches!(
            resolve_reference(&base(), "http://[broken"),
            Err(AcquisitionError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_leaf_path_sanitizes() {
        assert_eq!(
            leaf_path(Path::new("/out"), "Page/Two"),
            PathBuf::from("/out/Page-Two.pdf")
        );
    }

    #[tokio::test]
    async fn test_visits_in_document_order() {
        let root = tempfile::tempdir().unwrap();
        let tree: Children = [
            ("c", TocNode::leaf("/c")),
            ("a", TocNode::section([("inner", TocNode::leaf("/a/inner"))])),
            ("b", TocNode::leaf("/b")),
        ]
        .into_iter()
        .collect();

        let mut walker = Walker::new(Recorder::default(), base());
        let report = walker.walk(root.path(), &tree).await.unwrap();
        let urls: Vec<String> = walker.into_inner().calls.into_iter().map(|(u, _)| u).collect();
        assert_eq!(urls, ["/c", "/a/inner", "/b"]);
        assert_eq!(report.rendered, 3);
        assert_eq!(report.directories_created, 1);
    }

    #[tokio::test]
    async fn test_failed_leaf_does_not_stop_siblings() {
        let root = tempfile::tempdir().unwrap();
        let tree: Children = [
            ("a", TocNode::leaf("/a")),
            ("b", TocNode::leaf("/b")),
            ("c", TocNode::leaf("/c")),
        ]
        .into_iter()
        .collect();

        let recorder = Recorder {
            fail_on: vec!["/b".to_string()],
            ..Default::default()
        };
        let mut walker = Walker::new(recorder, base());
        let report = walker.walk(root.path(), &tree).await.unwrap();

        assert_eq!(walker.into_inner().calls.len(), 3);
        assert!(root.path().join("a.pdf").exists());
        assert!(!root.path().join("b.pdf").exists());
        assert!(root.path().join("c.pdf").exists());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "b");
    }

    #[tokio::test]
    async fn test_placeholder_leaf_is_skipped_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        let tree: Children = [
            ("broken", TocNode::leaf("undefined")),
            ("ok", TocNode::leaf("/ok")),
        ]
        .into_iter()
        .collect();

        let mut walker = Walker::new(Recorder::default(), base());
        let report = walker.walk(root.path(), &tree).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.rendered, 1);
        assert_eq!(walker.into_inner().calls.len(), 1);
    }

    #[tokio::test]
    async fn test_directory_error_aborts_remaining_siblings() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("Blocked"), b"file in the way").unwrap();
        let tree: Children = [
            ("first", TocNode::leaf("/first")),
            ("Blocked", TocNode::section([("x", TocNode::leaf("/x"))])),
            ("after", TocNode::leaf("/after")),
        ]
        .into_iter()
        .collect();

        let mut walker = Walker::new(Recorder::default(), base());
        let err = walker.walk(root.path(), &tree).await.unwrap_err();
        assert!(matches!(
            err,
            WalkError::Filesystem(FilesystemError::NotADirectory(_))
        ));
        let urls: Vec<String> = walker.into_inner().calls.into_iter().map(|(u, _)| u).collect();
        assert_eq!(urls, ["/first"]);
    }

    #[tokio::test]
    async fn test_placeholder_section_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let tree: Children = [("undefined", TocNode::section([("x", TocNode::leaf("/x"))]))]
            .into_iter()
            .collect();
        let mut walker = Walker::new(Recorder::default(), base());
        assert!(matches!(
            walker.walk(root.path(), &tree).await,
            Err(WalkError::MalformedNode { .. })
        ));
    }

    #[tokio::test]
    async fn test_existing_directories_are_reused() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("Section-1")).unwrap();
        let tree: Children = [(
            "Section/1",
            TocNode::section([("p", TocNode::leaf("/p"))]),
        )]
        .into_iter()
        .collect();
        let mut walker = Walker::new(Recorder::default(), base());
        let report = walker.walk(root.path(), &tree).await.unwrap();
        assert_eq!(report.directories_existing, 1);
        assert!(root.path().join("Section-1").join("p.pdf").exists());
    }
}
