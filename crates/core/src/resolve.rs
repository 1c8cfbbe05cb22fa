//! Turn whatever the user pasted (BV id, video URL, short link or share
//! text) into a canonical BV id.

use crate::client::BiliClient;
use crate::error::ApiError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

static BVID: Lazy<Regex> = Lazy::new(|| Regex::new(r"BV[0-9A-Za-z]+").unwrap());

static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").unwrap());

/// Domains that only redirect to a canonical video page.
pub const SHORT_LINK_DOMAINS: [&str; 4] = ["b23.tv", "acg.tv", "bili2233.cn", "bili2233.com"];

/// An optional scheme, a short-link domain and a path of URL characters.
/// The path ends at the first non-URL character, e.g. full-width punctuation.
static SHORT_LINK: Lazy<Regex> = Lazy::new(|| {
    let domains: Vec<String> = SHORT_LINK_DOMAINS.iter().map(|d| regex::escape(d)).collect();
    Regex::new(&format!(
        r"(?i)(?:[a-z][a-z0-9+.-]*://)?(?:{})(?:/[0-9A-Za-z_\-./?=&%#~+]*)?",
        domains.join("|")
    ))
    .unwrap()
});

/// Something that can follow HTTP redirects and report where they end.
pub trait LinkFollower {
    fn follow(&self, url: &str) -> Result<String, ApiError>;
}

impl LinkFollower for BiliClient {
    fn follow(&self, url: &str) -> Result<String, ApiError> {
        self.final_url(url)
    }
}

/// Outcome of resolving a video reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// The input already contained a BV id.
    Direct(String),
    /// The BV id came from the target of a short link.
    ShortLink(String),
    /// Nothing matched; this is the trimmed input, which may not be valid.
    Unresolved(String),
}

impl Reference {
    pub fn as_str(&self) -> &str {
        match self {
            Reference::Direct(id) | Reference::ShortLink(id) | Reference::Unresolved(id) => id,
        }
    }
}

/// First BV id embedded anywhere in `input`.
pub fn extract_bvid(input: &str) -> Option<&str> {
    BVID.find(input).map(|m| m.as_str())
}

/// True when `input` mentions one of [`SHORT_LINK_DOMAINS`], in any case.
pub fn is_short_link(input: &str) -> bool {
    SHORT_LINK.is_match(input)
}

/// Cut the short link out of `input` and make it absolute.
/// Share text such as `【title】 b23.tv/abc` yields `https://b23.tv/abc`.
pub fn normalize_short_link(input: &str) -> String {
    let candidate = SHORT_LINK
        .find(input)
        .map(|m| m.as_str())
        .unwrap_or(input)
        .trim();
    if SCHEME.is_match(candidate) {
        candidate.to_string()
    } else {
        format!("https://{candidate}")
    }
}

/// Resolve `input` to a BV id.
///
/// An embedded BV id always wins, even inside a URL that is also a short
/// link. Otherwise short links are followed once; a failed request is logged
/// and resolution falls through to returning the trimmed input.
pub fn resolve_reference<F: LinkFollower + ?Sized>(follower: &F, input: &str) -> Reference {
    trace!("resolve_reference input={input}");
    if let Some(id) = extract_bvid(input) {
        return Reference::Direct(id.to_string());
    }
    let candidate = input.trim();
    if is_short_link(candidate) {
        let url = normalize_short_link(candidate);
        match follower.follow(&url) {
            Ok(target) => {
                debug!("short link {url} redirected to {target}");
                if let Some(id) = extract_bvid(&target) {
                    return Reference::ShortLink(id.to_string());
                }
            }
            Err(err) => warn!("could not follow short link {url}: {err}"),
        }
    }
    Reference::Unresolved(candidate.to_string())
}
