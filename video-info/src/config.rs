//! Command-line configuration.

use clap::Parser;
use std::path::PathBuf;

/// Print the title, channel, duration and engagement counts of a YouTube video.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Video URL, e.g. https://www.youtube.com/watch?v=jNQXAC9IVRw.
    ///
    /// Read from standard input when omitted.
    pub url: Option<String>,

    /// OAuth client secrets downloaded from the Google Cloud console.
    #[arg(long, env = "YT_CLIENT_SECRET", default_value = "client_secret.json")]
    pub client_secret: PathBuf,

    /// Where the OAuth credential is cached between runs.
    #[arg(long, env = "YT_TOKEN_CACHE", default_value = "token.json")]
    pub token_cache: PathBuf,

    /// Local port that receives the OAuth consent redirect.
    #[arg(long, env = "YT_OAUTH_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Print the consent URL instead of opening a browser.
    #[arg(long)]
    pub no_browser: bool,
}
