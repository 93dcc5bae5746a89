//! Decoding of the compact `contentDetails.duration` encoding.
//!
//! The YouTube API reports durations as a restricted ISO 8601 period such as `PT1H2M3S`: a
//! leading marker followed by `<number><unit>` pairs in descending magnitude, any of which may be
//! absent. For display we only care about the numbers, in order, so `PT1H2M3S` becomes `1:2:3`,
//! `PT5M50S` becomes `5:50` and `PT15S` becomes `15`.
//!
//! The result is meant for humans. Missing components are not re-derived, so `PT1H` and `PT1S`
//! both render as `1`.

use crate::Error;

/// Renders a compact duration as colon-separated components.
///
/// Components are emitted as written (no zero padding). Fails with [`Error::InvalidDuration`] if
/// the leading `P` marker is missing or there is no numeric component at all.
pub fn decode_duration(duration: &str) -> Result<String, Error> {
    let invalid = || Error::InvalidDuration {
        duration: duration.to_string(),
    };

    let rest = duration
        .strip_prefix("PT")
        .or_else(|| duration.strip_prefix('P'))
        .ok_or_else(invalid)?;

    let components: Vec<&str> = rest
        .split(|c: char| c.is_ascii_alphabetic())
        .filter(|part| !part.is_empty())
        .collect();

    if components.is_empty() {
        return Err(invalid());
    }

    Ok(components.join(":"))
}
