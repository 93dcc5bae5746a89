//! YouTube Data API v3 client library.
//!
//! Just enough of the API to look up one video: an authenticated [`YouTubeClient`] and the
//! `videos.list` resources it returns.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_video_info::credentials;
//! use youtube_video_info::config::Config;
//!
//! # async fn example(config: &Config) -> Result<(), youtube_video_info::Error> {
//! let client = credentials::authorize(config).await?;
//! let response = client.get_video_details("jNQXAC9IVRw").await?;
//! for video in &response.items {
//!     println!("{}: {}", video.id, video.snippet.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;
pub mod videos;

pub use client::YouTubeClient;
pub use types::PageInfo;
pub use videos::{Video, VideoContentDetails, VideoListResponse, VideoSnippet, VideoStatistics};
