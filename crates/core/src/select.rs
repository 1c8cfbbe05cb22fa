//! Track selection by language whitelist or category priority.

use crate::tracks::SubtitleTrack;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Coarse language family of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    En,
    Zh,
    Other,
}

/// Priority used when the caller gives none.
pub const DEFAULT_PRIORITY: [Category; 3] = [Category::En, Category::Zh, Category::Other];

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::En => "en",
            Category::Zh => "zh",
            Category::Other => "other",
        }
    }

    /// Classify a language code, ignoring case.
    /// AI tracks (`ai-en`, `ai-zh-…`) join the family they transcribe.
    pub fn of(lang: &str) -> Category {
        let lang = lang.to_lowercase();
        let family = |code: &str| {
            lang.starts_with(&format!("ai-{code}"))
                || lang == code
                || lang.starts_with(&format!("{code}-"))
        };
        if family("en") {
            Category::En
        } else if family("zh") {
            Category::Zh
        } else {
            Category::Other
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Category::En),
            "zh" => Ok(Category::Zh),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown language category '{other}'")),
        }
    }
}

/// Parse priority names, skipping the ones that are not a category.
pub fn parse_priority<S: AsRef<str>>(names: &[S]) -> Vec<Category> {
    names
        .iter()
        .filter(|n| !n.as_ref().trim().is_empty())
        .filter_map(|n| match n.as_ref().parse() {
            Ok(category) => Some(category),
            Err(err) => {
                warn!("ignoring priority entry: {err}");
                None
            }
        })
        .collect()
}

/// Does `lang` match whitelist entry `entry`?
/// Entries ending in `-` match every code they prefix.
pub fn whitelist_matches(lang: &str, entry: &str) -> bool {
    lang == entry || (entry.ends_with('-') && lang.starts_with(entry))
}

/// Every track whose language matches one of `whitelist`, in original order.
pub fn filter_by_whitelist<'a, S: AsRef<str>>(
    tracks: &'a [SubtitleTrack],
    whitelist: &[S],
) -> Vec<&'a SubtitleTrack> {
    tracks
        .iter()
        .filter(|t| whitelist.iter().any(|w| whitelist_matches(&t.lang, w.as_ref())))
        .collect()
}

/// The whole bucket of the first category in `priority` that has tracks.
pub fn select_by_priority<'a>(
    tracks: &'a [SubtitleTrack],
    priority: &[Category],
) -> Option<(Category, Vec<&'a SubtitleTrack>)> {
    priority.iter().find_map(|&category| {
        let bucket: Vec<_> = tracks
            .iter()
            .filter(|t| Category::of(&t.lang) == category)
            .collect();
        (!bucket.is_empty()).then_some((category, bucket))
    })
}

/// Result of choosing among enumerated tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Candidates in order; only the first is downloaded.
    Picked(Vec<&'a SubtitleTrack>),
    /// A whitelist was given and nothing matched it.
    NoWhitelistMatch,
    /// No category in the priority list had a track.
    NoPriorityMatch,
}

impl<'a> Selection<'a> {
    pub fn first(&self) -> Option<&'a SubtitleTrack> {
        match self {
            Selection::Picked(tracks) => tracks.first().copied(),
            _ => None,
        }
    }
}

/// Choose tracks. A non-empty whitelist overrides `priority` entirely.
pub fn select<'a>(
    tracks: &'a [SubtitleTrack],
    whitelist: &[String],
    priority: &[Category],
) -> Selection<'a> {
    let whitelist: Vec<&str> = whitelist
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if !whitelist.is_empty() {
        let picked = filter_by_whitelist(tracks, &whitelist);
        debug!("whitelist {whitelist:?} kept {} track(s)", picked.len());
        return if picked.is_empty() {
            Selection::NoWhitelistMatch
        } else {
            Selection::Picked(picked)
        };
    }
    match select_by_priority(tracks, priority) {
        Some((category, picked)) => {
            debug!("priority picked category {category} with {} track(s)", picked.len());
            Selection::Picked(picked)
        }
        None => Selection::NoPriorityMatch,
    }
}
