//! `manual-mirror toc <KIND/ID>`: fetch and print a manual's parsed ToC.

use super::output;
use crate::config::{MirrorConfig, Overrides};
use crate::toc::fetch::TocClient;
use crate::toc::parse::parse_toc;
use crate::toc::{Children, ManualRef};
use anyhow::Result;
use std::time::Duration;

/// Run the toc command.
pub async fn run(manual: &ManualRef, overrides: Overrides) -> Result<()> {
    let config = MirrorConfig::resolve(overrides)?;
    let client = TocClient::new(config.toc_url, Duration::from_secs(60));
    let toc = parse_toc(&client.fetch(manual).await?)?;

    if !output::is_quiet() && !output::is_json() {
        eprintln!("  {} pages in {manual}", toc.leaf_count());
    }
    println!("{}", render_toc(&toc)?);
    Ok(())
}

/// Pretty JSON for a tree, keys in document order.
///
/// Serializes `Children` directly; going through `serde_json::Value`
/// would sort every level.
pub fn render_toc(toc: &Children) -> Result<String> {
    Ok(serde_json::to_string_pretty(toc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::TocNode;

    #[test]
    fn test_render_keeps_document_order() {
        let toc: Children = [
            ("Zebra", TocNode::leaf("/z")),
            (
                "Middle",
                TocNode::section([("Yak", TocNode::leaf("/y")), ("Bee", TocNode::leaf("/b"))]),
            ),
            ("Apple", TocNode::leaf("/a")),
        ]
        .into_iter()
        .collect();

        let rendered = render_toc(&toc).unwrap();
        let at = |key: &str| rendered.find(&format!("\"{key}\"")).unwrap();
        assert!(at("Zebra") < at("Middle"));
        assert!(at("Middle") < at("Apple"));
        assert!(at("Yak") < at("Bee"));

        let compact: String = rendered.split_whitespace().collect();
        assert_eq!(
            compact,
            r#"{"Zebra":"/z","Middle":{"Yak":"/y","Bee":"/b"},"Apple":"/a"}"#
        );
    }
}
