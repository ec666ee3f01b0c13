// Copyright 2026 Manual Mirror Contributors
// SPDX-License-Identifier: Apache-2.0

//! manual-mirror library: mirror a service manual's table of contents into
//! a local directory tree of PDFs using a headless browser.
//!
//! The engine lives in [`mirror`] (tree walk) and [`acquisition`] (one page
//! to one PDF). [`renderer`] abstracts the browsing session, [`toc`] holds
//! the tree model and its fetch/parse collaborators.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod mirror;
pub mod renderer;
pub mod toc;
