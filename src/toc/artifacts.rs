//! Auxiliary files written next to a mirrored manual.
//!
//! - `toc-full.xml`: the ToC exactly as fetched
//! - `toc-downloaded.json`: the parsed tree, pretty printed
//! - `toc.js`: the tree as a script assigning `document.toc`, so a local
//!   viewer page can load it without a fetch

use super::Children;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const RAW_TOC_FILE: &str = "toc-full.xml";
pub const JSON_TOC_FILE: &str = "toc-downloaded.json";
pub const SCRIPT_TOC_FILE: &str = "toc.js";

/// Paths of the written artifacts.
#[derive(Debug, Clone)]
pub struct TocArtifacts {
    pub raw: PathBuf,
    pub json: PathBuf,
    pub script: PathBuf,
}

/// Write all three artifacts into `dir` concurrently.
pub async fn write_artifacts(dir: &Path, raw_xml: &str, toc: &Children) -> Result<TocArtifacts> {
    let artifacts = TocArtifacts {
        raw: dir.join(RAW_TOC_FILE),
        json: dir.join(JSON_TOC_FILE),
        script: dir.join(SCRIPT_TOC_FILE),
    };

    let pretty = serde_json::to_string_pretty(toc).context("failed to serialize ToC")?;
    let script = toc_script(toc)?;

    tokio::try_join!(
        async {
            tokio::fs::write(&artifacts.raw, raw_xml)
                .await
                .with_context(|| format!("failed to write {}", artifacts.raw.display()))
        },
        async {
            tokio::fs::write(&artifacts.json, pretty)
                .await
                .with_context(|| format!("failed to write {}", artifacts.json.display()))
        },
        async {
            tokio::fs::write(&artifacts.script, script)
                .await
                .with_context(|| format!("failed to write {}", artifacts.script.display()))
        },
    )?;

    Ok(artifacts)
}

/// Render the `toc.js` body.
///
/// The JSON is embedded in a template literal and parsed at load time.
/// Escaped quotes (`\"`) are dropped, as viewers of earlier mirrors expect;
/// backticks and `${` are escaped so the literal stays intact.
pub fn toc_script(toc: &Children) -> Result<String> {
    let json = serde_json::to_string(toc).context("failed to serialize ToC")?;
    let body = json
        .replace("\\\"", "")
        .replace('`', "\\`")
        .replace("${", "\\${");
    Ok(format!("document.toc = JSON.parse(`{body}`);"))
}

/// Load a previously written `toc-downloaded.json`.
pub async fn read_json_toc(path: &Path) -> Result<Children> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid ToC JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::TocNode;
    use assert_json_diff::assert_json_eq;

    fn sample() -> Children {
        [
            (
                "Engine",
                TocNode::section([("Overview", TocNode::leaf("/e/1.svc"))]),
            ),
            ("Say \"hi\"", TocNode::leaf("/q.svc")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_script_wraps_compact_json_and_strips_escaped_quotes() {
        let script = toc_script(&sample()).unwrap();
        assert_eq!(
            script,
            r#"document.toc = JSON.parse(`{"Engine":{"Overview":"/e/1.svc"},"Say hi":"/q.svc"}`);"#
        );
    }

    #[test]
    fn test_script_escapes_template_syntax() {
        let toc: Children = [("a`b${c}", TocNode::leaf("/x"))].into_iter().collect();
        let script = toc_script(&toc).unwrap();
        assert!(script.contains(r#""a\`b\${c}""#));
    }

    #[tokio::test]
    async fn test_write_artifacts_round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_artifacts(dir.path(), "<toc/>", &sample()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&written.raw).unwrap(), "<toc/>");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written.json).unwrap()).unwrap();
        assert_json_eq!(
            json,
            serde_json::json!({
                "Engine": { "Overview": "/e/1.svc" },
                "Say \"hi\"": "/q.svc"
            })
        );

        let reloaded = read_json_toc(&written.json).await.unwrap();
        assert_eq!(reloaded, sample());
        assert!(written.script.exists());
    }
}
