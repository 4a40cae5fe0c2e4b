//! Backend identity derivation for document handles.
//!
//! The backend keys summaries and QA on a `unique_id` plus a normalized
//! file name. Freshly uploaded documents carry the id from the storage key;
//! previously stored documents only have an object URL of the form
//!
//! ```text
//! https://<bucket-host>/<prefix>/<user>/<unique_id>_<file name>.<ext>?<signature>
//!   [0]  [1]    [2]        [3]     [4]              [5]
//! ```
//!
//! from which both values are recovered.

use crate::error::{ClientError, ClientResult};
use crate::models::{DocumentHandle, Identity};

/// Minimum number of `/`-delimited URL segments needed to reach the id.
const MIN_URL_SEGMENTS: usize = 6;

/// Index of the segment whose `_`-prefix is the unique id.
const ID_SEGMENT: usize = 5;

/// Resolve the backend identity of a handle.
///
/// Uses `source_identifier` when present, otherwise parses the URL.
pub fn extract_identity(handle: &DocumentHandle) -> ClientResult<Identity> {
    match handle.source_identifier() {
        Some(id) if !id.is_empty() => Ok(Identity::Uploaded {
            id: id.to_string(),
            normalized_name: encode_stem(handle.name()),
        }),
        _ => identity_from_url(handle.url()),
    }
}

fn encode_stem(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    urlencoding::encode(stem).into_owned()
}

fn identity_from_url(url: &str) -> ClientResult<Identity> {
    let segments: Vec<&str> = url.split('/').collect();
    if segments.len() < MIN_URL_SEGMENTS {
        return Err(ClientError::MissingIdentifier(format!(
            "url has {} path segments, need at least {}: {}",
            segments.len(),
            MIN_URL_SEGMENTS,
            url
        )));
    }

    let id = segments[ID_SEGMENT].split('_').next().unwrap_or_default();
    if id.is_empty() {
        return Err(ClientError::MissingIdentifier(format!(
            "empty unique id in url: {}",
            url
        )));
    }

    let file = final_segment(url);
    let name = between_underscore_and_dot(file).ok_or_else(|| {
        ClientError::MissingIdentifier(format!("cannot extract file name from: {}", file))
    })?;

    Ok(Identity::Stored {
        id: id.to_string(),
        normalized_name: name
            .replace(' ', "%20")
            .replace('(', "%28")
            .replace(')', "%29"),
    })
}

/// Last path segment of a URL with any query string removed.
pub fn final_segment(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Human-readable name for a stored object segment.
///
/// `abc_My%Report.pdf` becomes `My Report`; segments without the
/// `_`/`.` structure are shown whole.
pub fn display_name(segment: &str) -> String {
    match between_underscore_and_dot(segment) {
        Some(name) => name.replace('%', " "),
        None => segment.to_string(),
    }
}

fn between_underscore_and_dot(segment: &str) -> Option<&str> {
    let underscore = segment.find('_')?;
    let dot = segment.find('.')?;
    if dot <= underscore {
        return None;
    }
    let name = segment[underscore + 1..dot].trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
