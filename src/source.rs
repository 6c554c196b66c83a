use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};

use crate::config::InputArgs;

pub const USER_AGENT: &str = "bpb4-to-v2ray/1.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    pub fn from_args(args: &InputArgs) -> Option<Self> {
        match (&args.url, &args.infile) {
            (Some(url), _) => Some(Self::Url(url.clone())),
            (None, Some(path)) => Some(Self::File(path.clone())),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads the document text. One attempt, no retries.
pub async fn load(source: &Source, timeout: Duration) -> anyhow::Result<String> {
    let text = match source {
        Source::Url(url) => fetch_text(url, timeout).await?,
        Source::File(path) => read_text(path)?,
    };
    info!(source = %source, bytes = text.len(), "loaded document");
    Ok(text)
}

async fn fetch_text(url: &str, timeout: Duration) -> anyhow::Result<String> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("build http client")?;

    debug!(url, timeout_secs = timeout.as_secs(), "fetching document");
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("fetch {url}"))?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("read response body from {url}"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
