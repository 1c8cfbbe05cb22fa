//! Danmaku view endpoint, keyed only by `cid`.
//! It often carries AI generated tracks when the player endpoints do not.

use super::{SubtitleHolder, SubtitleTrack, TrackSource, UrlField};
use crate::client::{BiliClient, Referer};
use crate::error::ApiError;
use crate::video::VideoMetadata;

const DM_VIEW_PATH: &str = "/x/v2/dm/view";

#[derive(Debug, Clone, Copy, Default)]
pub struct DmView;

impl TrackSource for DmView {
    fn name(&self) -> &'static str {
        "dm view"
    }

    fn required(&self) -> bool {
        false
    }

    fn list_tracks(
        &self,
        client: &BiliClient,
        video: &VideoMetadata,
    ) -> Result<Vec<SubtitleTrack>, ApiError> {
        let query = [("type", "1".to_string()), ("oid", video.cid.to_string())];
        let holder: SubtitleHolder =
            client.get_api(self.name(), DM_VIEW_PATH, &query, Referer::Omit)?;
        Ok(holder.into_tracks(UrlField::SubtitleUrlFirst))
    }
}
