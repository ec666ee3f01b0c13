//! Configuration loading and resolution.
//!
//! Each setting resolves as: explicit CLI flag, then environment variable,
//! then built-in default.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://techinfo.toyota.com";
pub const DEFAULT_LEAF_TIMEOUT_SECS: u64 = 120;

pub const ENV_BASE_URL: &str = "MANUAL_MIRROR_BASE_URL";
pub const ENV_TOC_URL: &str = "MANUAL_MIRROR_TOC_URL";
pub const ENV_OUT: &str = "MANUAL_MIRROR_OUT";
pub const ENV_LEAF_TIMEOUT: &str = "MANUAL_MIRROR_LEAF_TIMEOUT";
pub const ENV_CHROMIUM_PATH: &str = "MANUAL_MIRROR_CHROMIUM_PATH";

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub toc_url: Option<String>,
    pub output: Option<PathBuf>,
    pub leaf_timeout_secs: Option<u64>,
    pub chromium: Option<PathBuf>,
    pub headful: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Leaf references are joined onto this.
    pub base_url: Url,
    /// `{kind}/{id}/toc.xml` is fetched relative to this.
    pub toc_url: Url,
    /// Output root; `None` means a directory named after the manual ID.
    pub output: Option<PathBuf>,
    /// Per-stage acquisition bound; `None` disables it.
    pub leaf_timeout: Option<Duration>,
    pub chromium: Option<PathBuf>,
    pub headful: bool,
}

impl MirrorConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with a custom environment lookup.
    pub fn resolve_with(overrides: Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base = overrides
            .base_url
            .or_else(|| env(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base).with_context(|| format!("invalid base URL {base:?}"))?;

        let toc_url = match overrides.toc_url.or_else(|| env(ENV_TOC_URL)) {
            Some(toc) => Url::parse(&toc).with_context(|| format!("invalid ToC URL {toc:?}"))?,
            None => base_url.clone(),
        };

        let output = overrides
            .output
            .or_else(|| env(ENV_OUT).map(PathBuf::from));

        let secs = match overrides.leaf_timeout_secs {
            Some(secs) => secs,
            None => match env(ENV_LEAF_TIMEOUT) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{ENV_LEAF_TIMEOUT} must be whole seconds, got {raw:?}"))?,
                None => DEFAULT_LEAF_TIMEOUT_SECS,
            },
        };
        let leaf_timeout = (secs > 0).then(|| Duration::from_secs(secs));

        let chromium = overrides
            .chromium
            .or_else(|| env(ENV_CHROMIUM_PATH).map(PathBuf::from));

        Ok(Self {
            base_url,
            toc_url,
            output,
            leaf_timeout,
            chromium,
            headful: overrides.headful,
        })
    }

    /// Output root for a manual.
    pub fn output_for(&self, manual_id: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(manual_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = MirrorConfig::resolve_with(Overrides::default(), env_of(&[])).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://techinfo.toyota.com/");
        assert_eq!(cfg.toc_url, cfg.base_url);
        assert_eq!(cfg.leaf_timeout, Some(Duration::from_secs(120)));
        assert_eq!(cfg.output_for("RM123"), PathBuf::from("RM123"));
        assert!(!cfg.headful);
    }

    #[test]
    fn test_flag_beats_env_beats_default() {
        let env = env_of(&[
            (ENV_BASE_URL, "https://env.example.com"),
            (ENV_LEAF_TIMEOUT, "30"),
            (ENV_OUT, "/from-env"),
        ]);
        let overrides = Overrides {
            base_url: Some("https://flag.example.com".to_string()),
            ..Default::default()
        };
        let cfg = MirrorConfig::resolve_with(overrides, env).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://flag.example.com/");
        assert_eq!(cfg.leaf_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.output_for("x"), PathBuf::from("/from-env"));
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let overrides = Overrides {
            leaf_timeout_secs: Some(0),
            ..Default::default()
        };
        let cfg = MirrorConfig::resolve_with(overrides, env_of(&[])).unwrap();
        assert_eq!(cfg.leaf_timeout, None);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let bad_env = env_of(&[(ENV_LEAF_TIMEOUT, "soon")]);
        assert!(MirrorConfig::resolve_with(Overrides::default(), bad_env).is_err());

        let bad_url = Overrides {
            toc_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(MirrorConfig::resolve_with(bad_url, env_of(&[])).is_err());
    }
}
