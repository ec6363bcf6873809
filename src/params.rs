//! Name and birth date from the page address.
//!
//! Two encodings are accepted: a query string (`?name=Alex&bd=May%201`) and a single path
//! segment carrying the same pairs (`/name=Alex&&bd=May%201`, where `&&` counts as `&`).
//! Values are free text and are never validated.

use crate::foundation::error::CardResult;

const NAME_KEYS: &[&str] = &["name", "user"];
const DATE_KEYS: &[&str] = &["bd", "bd_date", "birthDate"];

/// Display name and date as given in the address, used verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardParams {
    pub name: String,
    pub birth_date: String,
}

impl CardParams {
    /// Resolve parameters from an absolute URL or a site-relative path.
    ///
    /// A non-empty query string wins over the path segment, even when it lacks one of the keys.
    pub fn from_url(input: &str) -> CardResult<Self> {
        let url = match url::Url::parse(input) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = url::Url::parse("http://localhost/").map_err(anyhow::Error::from)?;
                base.join(input).map_err(anyhow::Error::from)?
            }
            Err(e) => return Err(anyhow::Error::from(e).context("parse card url").into()),
        };

        if let Some(from_query) = url.query().and_then(Self::from_query) {
            tracing::debug!(source = "query", "resolved card parameters");
            return Ok(from_query);
        }

        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()));
        if let Some(from_path) = segment.and_then(Self::from_path_segment) {
            tracing::debug!(source = "path", "resolved card parameters");
            return Ok(from_path);
        }

        Ok(Self::default())
    }

    /// Parse a query string (without the leading `?`). Empty input yields `None`.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        if query.is_empty() {
            return None;
        }
        Some(Self::from_pairs(query))
    }

    /// Parse a path segment such as `name=Alex&&bd=2000-05-01`.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        let segment = segment.trim_start_matches('/');
        if segment.is_empty() {
            return None;
        }
        Some(Self::from_pairs(&segment.replace("&&", "&")))
    }

    fn from_pairs(encoded: &str) -> Self {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(encoded.as_bytes())
            .into_owned()
            .collect();
        Self {
            name: first_non_empty(&pairs, NAME_KEYS),
            birth_date: first_non_empty(&pairs, DATE_KEYS),
        }
    }
}

/// First value of the first alias whose first occurrence is non-empty.
fn first_non_empty(pairs: &[(String, String)], keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v))
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../tests/unit/params.rs"]
mod tests;
