//! Unified entry point used by both the CLI and the web server.
//! This module wires resolution, lookup, enumeration, selection and download.

use crate::client::BiliClient;
use crate::error::ApiError;
use crate::resolve::{resolve_reference, Reference};
use crate::select::{parse_priority, select, Category, Selection, DEFAULT_PRIORITY};
use crate::subtitle::{self, OutputFormat};
use crate::tracks::{enumerate_tracks, TrackList};
use crate::video::{lookup_video, VideoMetadata};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, trace, warn};

/// Caller preferences for choosing and rendering a track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Language codes to accept. When non-empty it replaces `priority`.
    pub whitelist: Vec<String>,
    /// Category names such as `["zh", "en", "other"]`.
    /// `None` or an empty list means `en, zh, other`.
    pub priority: Option<Vec<String>>,
    pub format: OutputFormat,
}

impl FetchOptions {
    pub fn priority(&self) -> Vec<Category> {
        match self.priority.as_deref() {
            Some(names) if names.iter().any(|n| !n.trim().is_empty()) => parse_priority(names),
            _ => DEFAULT_PRIORITY.to_vec(),
        }
    }
}

/// Everything known about a video before a track is chosen.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub reference: Reference,
    pub video: VideoMetadata,
    /// `None` when no endpoint listed a track.
    pub tracks: Option<TrackList>,
}

/// Resolve `input`, look the video up and enumerate its tracks.
pub fn discover(client: &BiliClient, input: &str) -> Result<Discovery, ApiError> {
    trace!("discover input={input}");
    let reference = resolve_reference(client, input);
    if let Reference::Unresolved(id) = &reference {
        warn!("no BV id found in '{id}', trying it as is");
    }
    let video = lookup_video(client, reference.as_str())?;
    let tracks = enumerate_tracks(client, &video)?;
    Ok(Discovery {
        reference,
        video,
        tracks,
    })
}

/// Outcome of a subtitle request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Subtitle { lang: String, text: String },
    NoTracks,
    NoWhitelistMatch,
    NoPriorityMatch,
}

/// Fetch the preferred subtitle of the video referenced by `input`.
pub fn fetch_subtitle(
    client: &BiliClient,
    input: &str,
    options: &FetchOptions,
) -> Result<Fetched, ApiError> {
    let discovery = discover(client, input)?;
    let Some(list) = discovery.tracks else {
        info!("{} has no subtitle tracks", discovery.reference.as_str());
        return Ok(Fetched::NoTracks);
    };
    let pick = match select(&list.tracks, &options.whitelist, &options.priority()) {
        Selection::Picked(tracks) => tracks[0],
        Selection::NoWhitelistMatch => return Ok(Fetched::NoWhitelistMatch),
        Selection::NoPriorityMatch => return Ok(Fetched::NoPriorityMatch),
    };
    info!("downloading '{}' subtitle from {}", pick.lang, list.source);
    let text = subtitle::download(client, &pick.url, options.format)?;
    Ok(Fetched::Subtitle {
        lang: pick.lang.clone(),
        text,
    })
}

/// Status codes carried by [`SubtitleResponse::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    NoTracks = 1,
    NoWhitelistMatch = 2,
    NoPriorityMatch = 3,
    Failed = 99,
}

impl Status {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn message(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::NoTracks => "no subtitles available (not logged in, or AI-only tracks not exposed)",
            Status::NoWhitelistMatch => "no subtitles left after whitelist filtering",
            Status::NoPriorityMatch => "no subtitles left after priority selection",
            Status::Failed => "processing failed",
        }
    }
}

/// Result object returned to delivery shims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleResponse {
    pub code: u8,
    pub msg: String,
    pub text: String,
    pub lang: String,
}

impl SubtitleResponse {
    /// A response without text for a non-ok status.
    pub fn empty(status: Status) -> Self {
        Self {
            code: status.code(),
            msg: status.message().to_string(),
            text: String::new(),
            lang: String::new(),
        }
    }

    /// Status 99 with the failure description appended.
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self {
            msg: format!("{}: {reason}", Status::Failed.message()),
            ..Self::empty(Status::Failed)
        }
    }
}

impl From<Result<Fetched, ApiError>> for SubtitleResponse {
    fn from(result: Result<Fetched, ApiError>) -> Self {
        match result {
            Ok(Fetched::Subtitle { lang, text }) => Self {
                code: Status::Ok.code(),
                msg: Status::Ok.message().to_string(),
                text,
                lang,
            },
            Ok(Fetched::NoTracks) => Self::empty(Status::NoTracks),
            Ok(Fetched::NoWhitelistMatch) => Self::empty(Status::NoWhitelistMatch),
            Ok(Fetched::NoPriorityMatch) => Self::empty(Status::NoPriorityMatch),
            Err(err) => Self::failed(err),
        }
    }
}

/// Run the whole pipeline and fold every outcome into a response.
pub fn fetch_subtitle_text(
    client: &BiliClient,
    input: &str,
    options: &FetchOptions,
) -> SubtitleResponse {
    let result = fetch_subtitle(client, input, options);
    if let Err(err) = &result {
        warn!("subtitle request for '{input}' failed: {err}");
    }
    result.into()
}
