//! URL rewrite engine.
//!
//! # Responsibilities
//! - Skip anything that is not `text/html`
//! - Turn absolute links back to the target domain into proxy-relative paths
//! - Prefix root-relative attribute values and CSS `url()` references with
//!   `/<domain>` so the browser keeps routing through the proxy
//!
//! # Design Decisions
//! - Three whole-body passes in a fixed order, each over the previous output
//! - Each substitution is a pure function of the captures
//! - Protocol-relative (`//host/...`) and already proxy-relative values are
//!   never touched, which keeps the output stable when fed back in

use axum::body::Bytes;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;

use crate::rewrite::patterns::PatternSet;

/// Whether a declared content type is eligible for rewriting.
pub fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html")
}

/// Rewrite a response body according to its content type.
///
/// Non-HTML bodies are returned as-is without being scanned.
pub fn rewrite_body(content_type: &str, body: Bytes, patterns: &PatternSet) -> Bytes {
    if !is_html(content_type) {
        return body;
    }
    match rewrite_html(&body, patterns) {
        Cow::Borrowed(_) => body,
        Cow::Owned(rewritten) => Bytes::from(rewritten),
    }
}

/// Apply the absolute, attribute and CSS rules in order.
pub fn rewrite_html<'a>(html: &'a [u8], patterns: &PatternSet) -> Cow<'a, [u8]> {
    let domain = patterns.domain().as_bytes();

    let out = Cow::Borrowed(html);
    let out = apply(out, patterns.absolute_url(), |caps| absolute_url(caps, domain));
    let out = apply(out, patterns.attribute_url(), |caps| attribute_url(caps, domain));
    apply(out, patterns.css_url(), |caps| css_url(caps, domain))
}

/// Run one replace-all pass, keeping the input when nothing matched.
fn apply<'a, F>(input: Cow<'a, [u8]>, re: &Regex, rule: F) -> Cow<'a, [u8]>
where
    F: FnMut(&Captures<'_>) -> Vec<u8>,
{
    let replaced = match re.replace_all(&input, rule) {
        Cow::Owned(bytes) => Some(bytes),
        Cow::Borrowed(_) => None,
    };
    match replaced {
        Some(bytes) => Cow::Owned(bytes),
        None => input,
    }
}

/// `https://<domain><suffix>` → `/<domain><suffix>`.
fn absolute_url(caps: &Captures<'_>, domain: &[u8]) -> Vec<u8> {
    proxied(domain, &caps[1])
}

/// `attr="/path"` → `attr="/<domain>/path"`.
fn attribute_url(caps: &Captures<'_>, domain: &[u8]) -> Vec<u8> {
    let (attr, value) = (&caps[1], &caps[2]);
    if !needs_prefix(value, domain) {
        return caps[0].to_vec();
    }

    let mut out = Vec::with_capacity(caps[0].len() + domain.len() + 1);
    out.extend_from_slice(attr);
    out.extend_from_slice(b"=\"");
    out.extend_from_slice(&proxied(domain, value));
    out.push(b'"');
    out
}

/// `url('/path')` → `url("/<domain>/path")`, always double-quoted.
fn css_url(caps: &Captures<'_>, domain: &[u8]) -> Vec<u8> {
    let token = unquote(&caps[1]);
    if !needs_prefix(token, domain) {
        return caps[0].to_vec();
    }

    let mut out = Vec::with_capacity(token.len() + domain.len() + 8);
    out.extend_from_slice(b"url(\"");
    out.extend_from_slice(&proxied(domain, token));
    out.extend_from_slice(b"\")");
    out
}

fn proxied(domain: &[u8], path: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(domain.len() + path.len() + 1);
    out.push(b'/');
    out.extend_from_slice(domain);
    out.extend_from_slice(path);
    out
}

/// Root-relative, not protocol-relative, not already under `/<domain>`.
fn needs_prefix(value: &[u8], domain: &[u8]) -> bool {
    value.starts_with(b"/") && !value.starts_with(b"//") && !is_proxy_relative(value, domain)
}

// Step 1 output such as `/example.com.au/x` keeps whatever followed the
// domain, so any value starting with `/<domain>` counts as already proxied.
fn is_proxy_relative(value: &[u8], domain: &[u8]) -> bool {
    value
        .strip_prefix(b"/")
        .is_some_and(|v| v.starts_with(domain))
}

/// Strip one layer of matching single or double quotes.
fn unquote(token: &[u8]) -> &[u8] {
    match token {
        [b'"', inner @ .., b'"'] | [b'\'', inner @ .., b'\''] => inner,
        _ => token,
    }
}
