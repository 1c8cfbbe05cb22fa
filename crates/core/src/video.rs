//! Video metadata lookup.

use crate::client::{BiliClient, Referer};
use crate::error::ApiError;
use serde::Deserialize;
use tracing::{debug, trace};

const VIEW_PATH: &str = "/x/web-interface/view";

/// The two numeric ids the subtitle endpoints are keyed by.
/// `cid` always refers to the first page of the video.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoMetadata {
    pub aid: u64,
    pub cid: u64,
    #[serde(default)]
    pub title: String,
}

/// Look up `bvid` on the web view endpoint.
pub fn lookup_video(client: &BiliClient, bvid: &str) -> Result<VideoMetadata, ApiError> {
    trace!("lookup_video(bvid={bvid})");
    let meta: VideoMetadata =
        client.get_api("view", VIEW_PATH, &[("bvid", bvid.to_string())], Referer::Omit)?;
    debug!("{bvid} -> aid={} cid={} ({})", meta.aid, meta.cid, meta.title);
    Ok(meta)
}
