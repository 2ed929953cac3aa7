//! Link absolutization and image URL rewrites.

use regex::Regex;
use url::Url;

use crate::error::ExtractionError;

/// Resolves a tile's `href` into an absolute http(s) URL.
///
/// Absolute URLs are returned unchanged. Anything else, including
/// site-relative paths and protocol-relative `//host/...` links, is joined
/// onto `origin`.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidUrl`] when the result is not an http(s)
/// URL with a host (for example `javascript:` or `mailto:` links).
pub fn resolve_detail_url(origin: &Url, href: &str) -> Result<String, ExtractionError> {
    let href = href.trim();
    let invalid = |reason: String| ExtractionError::InvalidUrl {
        href: href.to_owned(),
        reason,
    };

    match Url::parse(href) {
        Ok(url) => {
            check_web_url(&url).map_err(invalid)?;
            Ok(href.to_owned())
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let joined = origin.join(href).map_err(|e| invalid(e.to_string()))?;
            check_web_url(&joined).map_err(invalid)?;
            Ok(joined.to_string())
        }
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Like [`resolve_detail_url`] but for optional fields: unusable values
/// become `None`.
#[must_use]
pub fn absolutize(origin: &Url, raw: &str) -> Option<String> {
    resolve_detail_url(origin, raw).ok()
}

fn check_web_url(url: &Url) -> Result<(), String> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.has_host() {
        return Err("missing host".to_owned());
    }
    Ok(())
}

/// Compiled thumbnail-to-full-size substitutions, applied in order.
#[derive(Debug, Clone, Default)]
pub struct ImageRewriter {
    rules: Vec<(Regex, String)>,
}

impl ImageRewriter {
    #[must_use]
    pub fn new(rules: Vec<(Regex, String)>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn apply(&self, url: &str) -> String {
        self.rules
            .iter()
            .fold(url.to_owned(), |acc, (pattern, replacement)| {
                pattern.replace(&acc, replacement.as_str()).into_owned()
            })
    }
}
