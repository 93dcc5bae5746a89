//! The human-readable video report.

use crate::Error;
use crate::duration::decode_duration;
use crate::youtube_api::{Video, VideoListResponse};
use std::fmt;

/// Shown for counts the API leaves out, like dislikes on videos you don't own.
const NOT_AVAILABLE: &str = "N/A";

/// Everything printed about one video.
///
/// Statistics are kept exactly as the API sent them; no numeric reformatting happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReport {
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub publish_time: String,
    /// Already decoded, e.g. `5:50`.
    pub duration: String,
    pub comment_count: Option<String>,
    pub like_count: Option<String>,
    pub dislike_count: Option<String>,
    pub view_count: Option<String>,
}

impl VideoReport {
    /// Builds the report from the first item of a `videos.list` response.
    ///
    /// An empty item list means the video doesn't exist (or isn't visible to this account) and
    /// yields [`Error::EmptyResult`] rather than a partial report.
    pub fn from_response(response: VideoListResponse, video_id: &str) -> Result<Self, Error> {
        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResult {
                video_id: video_id.to_string(),
            })?;
        Self::from_video(video)
    }

    pub fn from_video(video: Video) -> Result<Self, Error> {
        let Video {
            snippet,
            content_details,
            statistics,
            ..
        } = video;

        Ok(Self {
            duration: decode_duration(&content_details.duration)?,
            title: snippet.title,
            description: snippet.description,
            channel_title: snippet.channel_title,
            publish_time: snippet.published_at,
            comment_count: statistics.comment_count,
            like_count: statistics.like_count,
            dislike_count: statistics.dislike_count,
            view_count: statistics.view_count,
        })
    }
}

impl fmt::Display for VideoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |c: &Option<String>| c.as_deref().unwrap_or(NOT_AVAILABLE).to_string();
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Channel Title: {}", self.channel_title)?;
        writeln!(f, "Publish time: {}", self.publish_time)?;
        writeln!(f, "Duration: {}", self.duration)?;
        writeln!(f, "Number of comments: {}", count(&self.comment_count))?;
        writeln!(f, "Number of likes: {}", count(&self.like_count))?;
        writeln!(f, "Number of dislikes: {}", count(&self.dislike_count))?;
        writeln!(f, "Number of views: {}", count(&self.view_count))
    }
}
