//! Subtitle track enumeration.
//! This module tries a fixed list of endpoints in order and keeps the first
//! non-empty track list.

use crate::client::BiliClient;
use crate::error::ApiError;
use crate::video::VideoMetadata;
use serde::Deserialize;
use tracing::{debug, info, trace, warn};

pub mod dmview;
pub mod player;

/// A subtitle track that can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    /// Language code such as `zh-CN` or `ai-en`. May be empty.
    pub lang: String,
    /// Absolute URL of the JSON payload.
    pub url: String,
}

/// Which URL field an endpoint fills in reliably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UrlField {
    UrlFirst,
    SubtitleUrlFirst,
}

/// Track entry as returned upstream. Every field is optional and the
/// endpoints disagree on which ones they fill in.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawTrack {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    subtitle_url: Option<String>,
    #[serde(default)]
    lan: Option<String>,
    #[serde(default)]
    lang_key: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl RawTrack {
    /// Resolve the URL and language fields in priority order.
    /// Entries without any URL are rejected.
    pub(crate) fn into_track(self, order: UrlField) -> Option<SubtitleTrack> {
        let (first, second) = match order {
            UrlField::UrlFirst => (self.url, self.subtitle_url),
            UrlField::SubtitleUrlFirst => (self.subtitle_url, self.url),
        };
        let url = non_empty(first).or_else(|| non_empty(second))?;
        let lang = non_empty(self.lan)
            .or_else(|| non_empty(self.lang_key))
            .unwrap_or_default();
        Some(SubtitleTrack {
            lang,
            url: absolute_url(url),
        })
    }
}

/// Payload URLs often come back protocol-relative (`//host/path`).
fn absolute_url(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

/// The `data` member shape shared by all three endpoints:
/// `{"subtitle": {"subtitles": [...]}}`, any level of which may be null.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubtitleHolder {
    #[serde(default)]
    subtitle: Option<SubtitleSection>,
}

#[derive(Debug, Default, Deserialize)]
struct SubtitleSection {
    #[serde(default)]
    subtitles: Option<Vec<RawTrack>>,
}

impl SubtitleHolder {
    pub(crate) fn into_tracks(self, order: UrlField) -> Vec<SubtitleTrack> {
        self.subtitle
            .and_then(|s| s.subtitles)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| raw.into_track(order))
            .collect()
    }
}

/// One endpoint able to list the subtitle tracks of a video.
pub trait TrackSource {
    /// Short name used in logs and in [`TrackList::source`].
    fn name(&self) -> &'static str;

    /// When true any failure of this source aborts the enumeration.
    /// Otherwise only transport failures do and the rest count as empty.
    fn required(&self) -> bool;

    fn list_tracks(
        &self,
        client: &BiliClient,
        video: &VideoMetadata,
    ) -> Result<Vec<SubtitleTrack>, ApiError>;
}

/// Outcome of asking a single source.
#[derive(Debug)]
pub enum Probe {
    Found(Vec<SubtitleTrack>),
    Empty,
    /// A best-effort source failed in a way that is treated as empty.
    Degraded(ApiError),
}

/// Ask `source` and classify its answer.
pub fn probe(
    source: &dyn TrackSource,
    client: &BiliClient,
    video: &VideoMetadata,
) -> Result<Probe, ApiError> {
    trace!("probe source={}", source.name());
    match source.list_tracks(client, video) {
        Ok(tracks) if tracks.is_empty() => Ok(Probe::Empty),
        Ok(tracks) => Ok(Probe::Found(tracks)),
        Err(err) if source.required() || err.is_transport() => Err(err),
        Err(err) => Ok(Probe::Degraded(err)),
    }
}

/// Tracks together with the endpoint that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackList {
    pub source: &'static str,
    pub tracks: Vec<SubtitleTrack>,
}

/// Web player, then player v2, then danmaku view.
pub fn default_sources() -> Vec<Box<dyn TrackSource>> {
    vec![
        Box::new(player::WebPlayer),
        Box::new(player::PlayerV2),
        Box::new(dmview::DmView),
    ]
}

/// Enumerate tracks using [`default_sources`].
pub fn enumerate_tracks(
    client: &BiliClient,
    video: &VideoMetadata,
) -> Result<Option<TrackList>, ApiError> {
    enumerate_with(&default_sources(), client, video)
}

/// Try `sources` in order and return the first non-empty list.
/// `Ok(None)` means no source had any track.
pub fn enumerate_with(
    sources: &[Box<dyn TrackSource>],
    client: &BiliClient,
    video: &VideoMetadata,
) -> Result<Option<TrackList>, ApiError> {
    for source in sources {
        match probe(source.as_ref(), client, video)? {
            Probe::Found(tracks) => {
                info!("{} listed {} subtitle track(s)", source.name(), tracks.len());
                return Ok(Some(TrackList {
                    source: source.name(),
                    tracks,
                }));
            }
            Probe::Empty => debug!("{} listed no subtitle tracks", source.name()),
            Probe::Degraded(err) => warn!("{} unavailable, trying next source: {err}", source.name()),
        }
    }
    Ok(None)
}
