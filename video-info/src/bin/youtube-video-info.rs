use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_video_info::config::Config;
use youtube_video_info::{credentials, video_report};

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let config = Config::parse();

    let client = credentials::authorize(&config)
        .await
        .context("authenticate with YouTube")?;

    let url = match &config.url {
        Some(url) => url.clone(),
        None => prompt_for_url(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
            .context("read video URL")?,
    };

    let report = video_report(&client, &url)
        .await
        .with_context(|| format!("look up {url}"))?;
    print!("{report}");

    Ok(())
}

/// Asks for the URL on `output` and reads one line of `input`.
///
/// Running out of input is an error of its own; an empty line is passed on and rejected as a
/// bad URL later.
async fn prompt_for_url<R, W>(mut input: R, mut output: W) -> eyre::Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(b"Enter YouTube video URL: ").await?;
    output.flush().await?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .await
        .context("read from stdin")?;
    if read == 0 {
        eyre::bail!("no video URL given on stdin");
    }
    Ok(line.trim().to_string())
}
