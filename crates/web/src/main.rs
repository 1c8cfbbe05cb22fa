//! HTTP front end: a form page and a JSON endpoint around the subtitle pipeline.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bilisub_core::{fetch_subtitle_text, BiliClient, FetchOptions, OutputFormat, SubtitleResponse};
use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Command line options for the server.
#[derive(Parser, Debug)]
#[command(name = "bilisub-web")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BILISUB_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "BILISUB_PORT", default_value_t = 17772)]
    port: u16,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,
}

#[derive(Clone)]
struct AppState {
    client: Arc<BiliClient>,
}

/// A list given either as a JSON array or as one comma separated string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ListField {
    Many(Vec<String>),
    One(String),
}

impl ListField {
    fn into_vec(self) -> Vec<String> {
        match self {
            ListField::Many(items) => items,
            ListField::One(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Body of `POST /api/subtitle`.
#[derive(Debug, Default, Deserialize)]
struct SubtitleRequest {
    #[serde(default)]
    url: String,
    #[serde(default)]
    whitelist: Option<ListField>,
    #[serde(default)]
    lang_priority: Option<ListField>,
    #[serde(default)]
    format: Option<String>,
}

impl SubtitleRequest {
    fn options(&self) -> Result<FetchOptions, String> {
        let format = match self.format.as_deref() {
            Some(f) => f.parse()?,
            None => OutputFormat::default(),
        };
        Ok(FetchOptions {
            whitelist: self
                .whitelist
                .clone()
                .map(ListField::into_vec)
                .unwrap_or_default(),
            priority: self.lang_priority.clone().map(ListField::into_vec),
            format,
        })
    }
}

/// Run one request through the blocking pipeline.
fn answer(client: &BiliClient, request: &SubtitleRequest) -> SubtitleResponse {
    match request.options() {
        Ok(options) => fetch_subtitle_text(client, request.url.trim(), &options),
        Err(reason) => SubtitleResponse::failed(reason),
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Domain outcomes always travel in the JSON body with HTTP 200.
/// The body is parsed as JSON whatever its content type.
async fn api_subtitle(State(state): State<AppState>, body: Bytes) -> Json<SubtitleResponse> {
    let request: SubtitleRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejecting subtitle request body: {err}");
            return Json(SubtitleResponse::failed(format!("invalid request body: {err}")));
        }
    };
    let client = state.client.clone();
    let response = tokio::task::spawn_blocking(move || answer(&client, &request))
        .await
        .unwrap_or_else(|err| {
            warn!("subtitle worker failed: {err}");
            SubtitleResponse::failed(err)
        });
    Json(response)
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "endpoint not found"})),
    )
        .into_response()
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/subtitle", post(api_subtitle))
        .fallback(not_found)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("failed to install Ctrl+C handler: {err}");
    }
}

async fn serve(addr: SocketAddr, client: Arc<BiliClient>) -> Result<()> {
    let app = router(AppState { client });
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::default()
            .add_directive("bilisub_web=trace".parse().unwrap())
            .add_directive("bilisub_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("bilisub_web=info".parse().unwrap())
            .add_directive("bilisub_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    // The blocking client must be built outside the async runtime and is only
    // used from `spawn_blocking` workers.
    let client = Arc::new(BiliClient::new().context("building HTTP client")?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    runtime.block_on(serve(SocketAddr::new(args.host, args.port), client.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use bilisub_core::ClientConfig;
    use httpmock::prelude::*;
    use serde_json::{json, Value};
    use std::future::Future;
    use tower::ServiceExt;

    fn run<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn client_for(server: &MockServer) -> Arc<BiliClient> {
        Arc::new(
            BiliClient::with_config(ClientConfig::default().with_api_base(server.base_url()))
                .unwrap(),
        )
    }

    #[test]
    fn request_accepts_missing_optional_fields() {
        let request: SubtitleRequest =
            serde_json::from_value(json!({"url": " BV1xx411c7mD "})).unwrap();
        let options = request.options().unwrap();
        assert!(options.whitelist.is_empty());
        assert!(options.priority.is_none());
        assert_eq!(options.format, OutputFormat::Text);
    }

    #[test]
    fn request_carries_whitelist_priority_and_format() {
        let request: SubtitleRequest = serde_json::from_value(json!({
            "url": "BV1",
            "whitelist": ["en-"],
            "lang_priority": ["zh", "en"],
            "format": "srt"
        }))
        .unwrap();
        let options = request.options().unwrap();
        assert_eq!(options.whitelist, vec!["en-"]);
        assert_eq!(options.priority, Some(vec!["zh".to_string(), "en".to_string()]));
        assert_eq!(options.format, OutputFormat::Srt);
    }

    #[test]
    fn unknown_format_is_reported_as_failure() {
        let request = SubtitleRequest {
            url: "BV1".into(),
            format: Some("ass".into()),
            ..SubtitleRequest::default()
        };
        let client = Arc::new(BiliClient::with_config(ClientConfig::default()).unwrap());
        let res = answer(&client, &request);
        assert_eq!(res.code, 99);
        assert!(res.msg.contains("ass"));
    }

    #[test]
    fn handler_returns_pipeline_result_as_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/x/web-interface/view")
                .query_param("bvid", "BV1xx411c7mD");
            then.status(200)
                .json_body(json!({"code": 0, "data": {"aid": 1, "cid": 2}}));
        });
        for path in ["/x/player/wbi/v2", "/x/player/v2", "/x/v2/dm/view"] {
            server.mock(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .json_body(json!({"code": 0, "data": {"subtitle": {"subtitles": []}}}));
            });
        }
        let client = client_for(&server);
        let state = AppState {
            client: client.clone(),
        };
        let body = Bytes::from(json!({"url": "https://www.bilibili.com/video/BV1xx411c7mD/"}).to_string());
        let Json(res) = run(api_subtitle(State(state), body));
        assert_eq!(res.code, 1);
        assert!(res.text.is_empty());
    }

    #[test]
    fn handler_reports_service_errors_in_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/x/web-interface/view");
            then.status(200)
                .json_body(json!({"code": -404, "message": "啥都木有"}));
        });
        let client = client_for(&server);
        let state = AppState {
            client: client.clone(),
        };
        let body = Bytes::from(json!({"url": "BV1missing"}).to_string());
        let Json(res) = run(api_subtitle(State(state), body));
        assert_eq!(res.code, 99);
        assert!(res.msg.contains("啥都木有"));
    }

    #[test]
    fn index_page_posts_to_api() {
        let Html(page) = run(index());
        assert!(page.contains("/api/subtitle"));
    }

    #[test]
    fn whitelist_and_priority_accept_comma_strings() {
        let request: SubtitleRequest = serde_json::from_value(json!({
            "url": "BV1",
            "whitelist": "en-US, zh-",
            "lang_priority": "zh,en"
        }))
        .unwrap();
        let options = request.options().unwrap();
        assert_eq!(options.whitelist, vec!["en-US", "zh-"]);
        assert_eq!(options.priority, Some(vec!["zh".to_string(), "en".to_string()]));
    }

    /// POST `body` through the router and decode the JSON reply.
    fn post_subtitle(client: Arc<BiliClient>, body: &str, content_type: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method("POST").uri("/api/subtitle");
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        run(async move {
            let response = router(AppState { client }).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        })
    }

    #[test]
    fn router_accepts_body_without_content_type() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/x/web-interface/view");
            then.status(200)
                .json_body(json!({"code": 0, "data": {"aid": 1, "cid": 2}}));
        });
        for path in ["/x/player/wbi/v2", "/x/player/v2", "/x/v2/dm/view"] {
            server.mock(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(json!({"code": 0, "data": {}}));
            });
        }
        let client = client_for(&server);
        let (status, body) = post_subtitle(client.clone(), r#"{"url":"BV1xx411c7mD"}"#, None);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 1);
        assert_eq!(body["text"], "");
    }

    #[test]
    fn router_answers_bad_body_with_status_99() {
        let client = Arc::new(BiliClient::with_config(ClientConfig::default()).unwrap());
        for bad in ["not json", r#"{"url": 5}"#, r#"{"url": "BV1", "whitelist": 3}"#] {
            let (status, body) = post_subtitle(client.clone(), bad, Some("application/json"));
            assert_eq!(status, StatusCode::OK, "{bad}");
            assert_eq!(body["code"], 99, "{bad}");
            assert!(body["msg"].as_str().unwrap().contains("invalid request body"));
        }
    }
}
