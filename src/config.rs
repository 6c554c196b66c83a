use std::path::PathBuf;

use clap::{Args, Parser};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One share link per line.
    Raw,
    /// Base64 of the raw text, as served by subscription endpoints.
    Base64,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bpb-links",
    about = "Convert BPB Panel JSON configs to vless:// and trojan:// share links",
    version = crate::version::VERSION
)]
pub struct Cli {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(
        long = "timeout",
        env = "BPB_LINKS_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..=600)
    )]
    pub timeout_secs: u64,

    #[arg(
        long,
        env = "BPB_LINKS_FORMAT",
        value_name = "FORMAT",
        default_value = "base64",
        value_enum
    )]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Subscription URL that returns the panel's JSON config.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Local JSON file.
    #[arg(long, value_name = "PATH")]
    pub infile: Option<PathBuf>,
}
