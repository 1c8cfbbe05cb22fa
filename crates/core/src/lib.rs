//! Fetch Bilibili subtitles as plain text or SRT.
//!
//! The pipeline is strictly sequential: [`resolve`] a user supplied reference
//! to a BV id, look up its numeric ids in [`video`], list subtitle tracks
//! with [`tracks`], pick one with [`select`] and download it with
//! [`subtitle`]. [`pipeline`] strings the stages together.

pub mod client;
pub mod error;
pub mod pipeline;
pub mod resolve;
pub mod select;
pub mod srt;
pub mod subtitle;
pub mod tracks;
pub mod video;

pub use client::{BiliClient, ClientConfig};
pub use error::ApiError;
pub use pipeline::{fetch_subtitle, fetch_subtitle_text, FetchOptions, Fetched, Status, SubtitleResponse};
pub use subtitle::OutputFormat;
