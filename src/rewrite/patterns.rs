//! Compiled URL patterns bound to one upstream domain.

use regex::bytes::{Regex, RegexBuilder};
use std::sync::LazyLock;

use crate::error::ProxyError;

/// Attributes whose quoted value may hold a root-relative URL.
const ATTRIBUTE_URL: &str = r#"(src|href|action|srcset|data-src|data-href)="([^"]*)""#;

/// CSS `url(...)` with the inner token captured verbatim, quotes included.
const CSS_URL: &str = r"url\(([^)]*)\)";

static ATTRIBUTE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| build(ATTRIBUTE_URL).expect("attribute URL pattern is valid"));

static CSS_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| build(CSS_URL).expect("CSS URL pattern is valid"));

/// Byte-oriented with Unicode classes off, so non-UTF-8 markup still scans.
fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).unicode(false).build()
}

/// The three rewrite patterns for a single domain.
///
/// Immutable after construction; shared between requests via `Arc`.
#[derive(Debug)]
pub struct PatternSet {
    domain: String,
    absolute_url: Regex,
    attribute_url: Regex,
    css_url: Regex,
}

impl PatternSet {
    /// Compile the pattern set for `domain`.
    ///
    /// The domain is escaped, so `.` and other metacharacters match literally.
    pub fn compile(domain: &str) -> Result<Self, ProxyError> {
        let absolute = format!(r#"https?://{}([^\s"'<>]*)"#, regex::escape(domain));
        let absolute_url = build(&absolute).map_err(|source| ProxyError::Pattern {
            domain: domain.to_string(),
            source,
        })?;

        Ok(Self {
            domain: domain.to_string(),
            absolute_url,
            attribute_url: ATTRIBUTE_URL_RE.clone(),
            css_url: CSS_URL_RE.clone(),
        })
    }

    /// Domain this set was compiled for.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `https?://<domain>` followed by the captured path/query/fragment.
    pub fn absolute_url(&self) -> &Regex {
        &self.absolute_url
    }

    /// `attr="value"` for the URL-bearing attributes.
    pub fn attribute_url(&self) -> &Regex {
        &self.attribute_url
    }

    /// `url(token)`.
    pub fn css_url(&self) -> &Regex {
        &self.css_url
    }
}
