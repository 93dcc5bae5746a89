//! Error kinds surfaced by the video-info library.

use thiserror::Error;

/// Boxed source error carried by the service-side variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can go wrong between reading a URL and printing a report.
///
/// [`Error::BadUrl`] is the only variant caused by user input; every other variant means the
/// service (or the local OAuth setup) could not produce an answer.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL carried no usable `v` query parameter.
    #[error("wasn't able to parse video URL: {url}")]
    BadUrl { url: String },

    /// `videos.list` answered, but with no items.
    #[error("no video found with id {video_id}")]
    EmptyResult { video_id: String },

    /// A `contentDetails.duration` value that isn't in the compact `PT#H#M#S` form.
    #[error("unrecognised video duration: {duration:?}")]
    InvalidDuration { duration: String },

    /// Client secrets, the consent flow, token exchange, or the credential cache failed.
    #[error("YouTube authentication failed")]
    Auth(#[source] BoxError),

    /// The request never made it, the API refused it, or the response made no sense.
    #[error("YouTube API request failed")]
    Transport(#[source] BoxError),
}

impl Error {
    /// True when retrying with a different input could fix the problem.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::BadUrl { .. })
    }

    pub(crate) fn auth(e: impl Into<BoxError>) -> Self {
        Self::Auth(e.into())
    }

    pub(crate) fn transport(e: impl Into<BoxError>) -> Self {
        Self::Transport(e.into())
    }
}
