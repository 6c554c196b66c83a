use std::collections::HashSet;

use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::config::OutputFormat;
use crate::document::{document_items, get_non_empty_array, get_non_empty_str};
use crate::link::{
    Classification, DEFAULT_NAME, LinkOutcome, build_link, classify_protocol, outbound_protocol,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    NoLinks { items: usize },
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLinks { items } => write!(
                f,
                "No vless/trojan links extracted from {items} item(s). Check your JSON structure or extend the protocol allow-list."
            ),
        }
    }
}

impl std::error::Error for SubscriptionError {}

/// Share links of one configuration item, in outbound order.
///
/// Anything that does not look like an item or an outbound is skipped, as are
/// outbounds the builders cannot represent.
pub fn extract_links_from_item(item: &Value) -> Vec<String> {
    let mut links = Vec::new();
    let Some(item) = item.as_object() else {
        debug!("skipping non-object item");
        return links;
    };

    let fallback_name = get_non_empty_str(item, "remarks").unwrap_or(DEFAULT_NAME);
    let Some(outbounds) = get_non_empty_array(item, "outbounds") else {
        return links;
    };

    for (idx, ob) in outbounds.iter().enumerate() {
        let Some(outbound) = ob.as_object() else {
            debug!(index = idx, "skipping non-object outbound");
            continue;
        };
        let protocol = outbound_protocol(ob).unwrap_or_default();
        let protocol = match classify_protocol(protocol) {
            Classification::Supported(p) => p,
            Classification::Skipped(p) | Classification::Unsupported(p) => {
                debug!(index = idx, protocol = p, "skipping outbound");
                continue;
            }
        };

        match build_link(protocol, outbound, fallback_name) {
            LinkOutcome::Built(link) => links.push(link),
            LinkOutcome::NotRepresentable(reason) => {
                debug!(
                    index = idx,
                    protocol = protocol.as_str(),
                    %reason,
                    "outbound not representable as share link"
                );
            }
        }
    }
    links
}

/// All share links of a document, deduplicated by exact string and kept in
/// first-seen order.
pub fn build_raw_lines(doc: &Value) -> Result<Vec<String>, SubscriptionError> {
    let items = document_items(doc);
    let mut seen: HashSet<String> = HashSet::new();
    let mut lines = Vec::new();
    for item in &items {
        for link in extract_links_from_item(item) {
            if seen.insert(link.clone()) {
                lines.push(link);
            }
        }
    }

    if lines.is_empty() {
        return Err(SubscriptionError::NoLinks { items: items.len() });
    }
    Ok(lines)
}

pub fn build_raw_text(doc: &Value) -> Result<String, SubscriptionError> {
    let lines = build_raw_lines(doc)?;
    Ok(join_lines_with_trailing_newline(&lines))
}

pub fn build_base64(doc: &Value) -> Result<String, SubscriptionError> {
    let raw = build_raw_text(doc)?;
    Ok(encode_base64(&raw))
}

pub fn render(lines: &[String], format: OutputFormat) -> String {
    let raw = join_lines_with_trailing_newline(lines);
    match format {
        OutputFormat::Raw => raw,
        OutputFormat::Base64 => encode_base64(&raw),
    }
}

fn encode_base64(raw: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
}

fn join_lines_with_trailing_newline(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(line);
    }
    out.push('\n');
    out
}
