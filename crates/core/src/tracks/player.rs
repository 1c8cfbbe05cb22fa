//! Player info endpoints keyed by `aid` and `cid`.

use super::{SubtitleHolder, SubtitleTrack, TrackSource, UrlField};
use crate::client::{BiliClient, Referer};
use crate::error::ApiError;
use crate::video::VideoMetadata;

const WEB_PLAYER_PATH: &str = "/x/player/wbi/v2";
const PLAYER_V2_PATH: &str = "/x/player/v2";

fn player_tracks(
    client: &BiliClient,
    endpoint: &'static str,
    path: &str,
    video: &VideoMetadata,
) -> Result<Vec<SubtitleTrack>, ApiError> {
    let query = [("aid", video.aid.to_string()), ("cid", video.cid.to_string())];
    let holder: SubtitleHolder = client.get_api(endpoint, path, &query, Referer::Site)?;
    Ok(holder.into_tracks(UrlField::UrlFirst))
}

/// Web player endpoint. Its failures are fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPlayer;

impl TrackSource for WebPlayer {
    fn name(&self) -> &'static str {
        "web player"
    }

    fn required(&self) -> bool {
        true
    }

    fn list_tracks(
        &self,
        client: &BiliClient,
        video: &VideoMetadata,
    ) -> Result<Vec<SubtitleTrack>, ApiError> {
        player_tracks(client, self.name(), WEB_PLAYER_PATH, video)
    }
}

/// Older player endpoint which sometimes lists AI tracks the web player hides.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerV2;

impl TrackSource for PlayerV2 {
    fn name(&self) -> &'static str {
        "player v2"
    }

    fn required(&self) -> bool {
        false
    }

    fn list_tracks(
        &self,
        client: &BiliClient,
        video: &VideoMetadata,
    ) -> Result<Vec<SubtitleTrack>, ApiError> {
        player_tracks(client, self.name(), PLAYER_V2_PATH, video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::tracks::{probe, Probe};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> BiliClient {
        BiliClient::with_config(ClientConfig::default().with_api_base(server.base_url())).unwrap()
    }

    fn video() -> VideoMetadata {
        VideoMetadata {
            aid: 170001,
            cid: 279786,
            title: String::new(),
        }
    }

    #[test]
    fn web_player_lists_tracks() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(WEB_PLAYER_PATH)
                .query_param("aid", "170001")
                .query_param("cid", "279786")
                .header("referer", "https://www.bilibili.com/");
            then.status(200).json_body(json!({
                "code": 0,
                "data": {"subtitle": {"allow_submit": false, "subtitles": [
                    {"id": 1, "lan": "zh-CN", "lan_doc": "中文（中国）", "subtitle_url": "//i0.hdslb.com/bfs/subtitle/zh.json"},
                    {"id": 2, "lan": "ai-en", "url": "https://aisubtitle.hdslb.com/en.json"},
                    {"id": 3, "lan": "ja"}
                ]}}
            }));
        });
        let tracks = WebPlayer.list_tracks(&client_for(&server), &video()).unwrap();
        mock.assert();
        assert_eq!(
            tracks,
            vec![
                SubtitleTrack {
                    lang: "zh-CN".into(),
                    url: "https://i0.hdslb.com/bfs/subtitle/zh.json".into(),
                },
                SubtitleTrack {
                    lang: "ai-en".into(),
                    url: "https://aisubtitle.hdslb.com/en.json".into(),
                },
            ]
        );
    }

    #[test]
    fn web_player_service_error_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(WEB_PLAYER_PATH);
            then.status(200).json_body(json!({"code": -352, "message": "风控校验失败"}));
        });
        let err = probe(&WebPlayer, &client_for(&server), &video()).unwrap_err();
        assert!(matches!(err, ApiError::Service { code: -352, .. }));
    }

    #[test]
    fn player_v2_service_error_degrades() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(PLAYER_V2_PATH);
            then.status(200).json_body(json!({"code": -400, "message": "请求错误"}));
        });
        let outcome = probe(&PlayerV2, &client_for(&server), &video()).unwrap();
        assert!(matches!(outcome, Probe::Degraded(ApiError::Service { .. })));
    }

    #[test]
    fn player_v2_transport_error_propagates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(PLAYER_V2_PATH);
            then.status(503);
        });
        let err = probe(&PlayerV2, &client_for(&server), &video()).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn player_v2_without_subtitles_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(PLAYER_V2_PATH);
            then.status(200).json_body(json!({"code": 0, "data": {"subtitle": {"subtitles": []}}}));
        });
        let outcome = probe(&PlayerV2, &client_for(&server), &video()).unwrap();
        assert!(matches!(outcome, Probe::Empty));
    }
}
