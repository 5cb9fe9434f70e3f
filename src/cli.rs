//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use reposter_core::{DEFAULT_CONFIG_PATH, DEFAULT_SOURCES_PATH};

/// Download image posts and republish them to a VK community wall.
///
/// `-d` downloads every URL in the sources file and records it. `-p` publishes
/// all recorded posts that are not on the wall yet. Both may be given; the
/// download runs first.
#[derive(Parser, Debug)]
#[command(name = "reposter")]
#[command(author, version, about)]
pub struct Args {
    /// Download the sources file and record each post
    #[arg(short, long)]
    pub download: bool,

    /// Publish every unposted record to the wall
    #[arg(short, long)]
    pub post: bool,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Newline-separated source URLs
    #[arg(short, long, default_value = DEFAULT_SOURCES_PATH)]
    pub sources: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// True when neither `-d` nor `-p` was given.
    #[must_use]
    pub fn nothing_to_do(&self) -> bool {
        !self.download && !self.post
    }
}
