//! Look up a single YouTube video through the Data API and describe it.
//!
//! The flow is linear: [`credentials::authorize`] produces an authenticated
//! [`YouTubeClient`], then [`video_report`] extracts the identifier from a watch URL, fetches the
//! video's details and turns them into a [`VideoReport`].

pub mod config;
pub mod credentials;
pub mod duration;
mod error;
pub mod oauth;
pub mod report;
pub mod video_id;
pub mod youtube_api;

#[cfg(test)]
pub(crate) mod mock;

pub use error::Error;
pub use report::VideoReport;
pub use youtube_api::YouTubeClient;

/// Resolves `url` to a video, fetches it, and builds its report.
#[tracing::instrument(skip(client))]
pub async fn video_report(client: &YouTubeClient, url: &str) -> Result<VideoReport, Error> {
    let video_id = video_id::video_id_from_url(url)?;
    tracing::debug!(video_id, "resolved video id");
    let response = client.get_video_details(&video_id).await?;
    VideoReport::from_response(response, &video_id)
}
