//! URL and response helpers shared by the Jira and Mayil clients.

use reqwest::{Response, Url};

use crate::error::{Error, Result};

/// Parse a configured service base URL.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url.trim())
        .map_err(|e| Error::Config(format!("invalid base URL {base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(Error::Config(format!("{base_url} cannot be used as a base URL")));
    }
    Ok(url)
}

/// Append `segments` to the base path, percent-encoding each one.
///
/// IDs arrive from webhooks and from Mayil, so every value is pushed as a single
/// segment: `/`, `?` and `#` are encoded and cannot change the route. Empty, `.` and
/// `..` segments are rejected since the URL parser would drop them.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    if let Some(bad) = segments
        .iter()
        .find(|s| matches!(**s, "" | "." | ".."))
    {
        return Err(Error::InvalidPathSegment((*bad).to_string()));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Map a non-2xx response to [`Error::FetchStatus`].
pub(crate) fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::FetchStatus {
            what: what.to_string(),
            status: status.as_u16(),
        })
    }
}
