//! Recovering a video identifier from a watch URL.

use crate::Error;

/// Returns the value of the `v` query parameter of `url`.
///
/// Only the query component is inspected, so the scheme and host don't matter and a URL without
/// a scheme (`www.youtube.com/watch?v=...`) works too. Blank values are skipped and the first
/// non-empty `v` wins. The identifier itself is not validated.
pub fn video_id_from_url(url: &str) -> Result<String, Error> {
    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);
    let query = without_fragment
        .split_once('?')
        .map_or("", |(_, query)| query);

    form_urlencoded::parse(query.as_bytes())
        .find(|(k, v)| k == "v" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| Error::BadUrl {
            url: url.to_string(),
        })
}
