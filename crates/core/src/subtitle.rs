//! Subtitle payload download and conversion to plain text or SRT.

use crate::client::BiliClient;
use crate::error::ApiError;
use crate::srt::{self, SrtBlock};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, trace};

/// One caption line of a payload.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SubtitleEntry {
    /// Start time in seconds.
    #[serde(default)]
    pub from: f64,
    /// End time in seconds.
    #[serde(default)]
    pub to: f64,
    #[serde(default)]
    pub content: Option<String>,
}

impl SubtitleEntry {
    /// Trimmed text, or `None` when there is nothing to show.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
struct SubtitlePayload {
    #[serde(default)]
    body: Option<Vec<SubtitleEntry>>,
}

/// Output rendering of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Caption text only, one entry per line.
    #[default]
    Text,
    Srt,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            "srt" => Ok(OutputFormat::Srt),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Download the payload at `url`. A missing or null `body` yields no entries.
pub fn fetch_entries(client: &BiliClient, url: &str) -> Result<Vec<SubtitleEntry>, ApiError> {
    trace!("fetch_entries(url={url})");
    let payload: SubtitlePayload = client.get_document("subtitle payload", url)?;
    let entries = payload.body.unwrap_or_default();
    debug!("payload has {} entries", entries.len());
    Ok(entries)
}

/// Non-blank trimmed entries joined by newlines.
pub fn to_plain_text(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .filter_map(SubtitleEntry::text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build SRT blocks. Blank entries are skipped before numbering so the
/// indices stay contiguous from 1.
pub fn to_srt_blocks(entries: &[SubtitleEntry]) -> Vec<SrtBlock> {
    entries
        .iter()
        .filter_map(|e| e.text().map(|text| (e, text)))
        .zip(1..)
        .map(|((entry, text), index)| SrtBlock {
            index,
            start_ms: srt::seconds_to_ms(entry.from),
            end_ms: srt::seconds_to_ms(entry.to),
            text: text.lines().map(str::to_string).collect(),
        })
        .collect()
}

pub fn to_srt(entries: &[SubtitleEntry]) -> String {
    srt::format(&to_srt_blocks(entries))
}

pub fn render(entries: &[SubtitleEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => to_plain_text(entries),
        OutputFormat::Srt => to_srt(entries),
    }
}

/// Fetch the payload at `url` and render it.
pub fn download(client: &BiliClient, url: &str, format: OutputFormat) -> Result<String, ApiError> {
    let entries = fetch_entries(client, url)?;
    Ok(render(&entries, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn entry(from: f64, to: f64, content: &str) -> SubtitleEntry {
        SubtitleEntry {
            from,
            to,
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn plain_text_skips_blank_entries() {
        let entries = vec![
            entry(0.0, 1.0, "  first "),
            entry(1.0, 2.0, "   "),
            SubtitleEntry::default(),
            entry(2.0, 3.0, "second"),
        ];
        assert_eq!(to_plain_text(&entries), "first\nsecond");
        assert_eq!(to_plain_text(&[]), "");
    }

    #[test]
    fn srt_indices_are_contiguous() {
        let entries = vec![
            entry(0.0, 1.5, "a"),
            entry(1.5, 2.0, " "),
            entry(2.0, 3.0, "b"),
            entry(3.0, 4.0, ""),
            entry(3725.25, 3726.0, "c"),
        ];
        let blocks = to_srt_blocks(&entries);
        let indices: Vec<u32> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(blocks[2].text, vec!["c".to_string()]);
        assert!(to_srt(&entries).contains("3\n01:02:05,250 --> 01:02:06,000\nc\n\n"));
    }

    #[test]
    fn srt_output_layout() {
        let entries = vec![entry(0.5, 2.25, "你好")];
        assert_eq!(to_srt(&entries), "1\n00:00:00,500 --> 00:00:02,250\n你好\n\n");
    }

    #[test]
    fn parses_output_format() {
        assert_eq!("SRT".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("vtt".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn downloads_and_renders_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/bfs/subtitle/en.json");
            then.status(200).json_body(json!({
                "font_size": 0.4,
                "body": [
                    {"from": 0.0, "to": 1.2, "location": 2, "content": "Hello"},
                    {"from": 1.2, "to": 2, "location": 2, "content": ""},
                    {"from": 2, "to": 3.5, "location": 2, "content": "world"}
                ]
            }));
        });
        let client =
            BiliClient::with_config(ClientConfig::default().with_api_base(server.base_url())).unwrap();
        let url = server.url("/bfs/subtitle/en.json");
        assert_eq!(download(&client, &url, OutputFormat::Text).unwrap(), "Hello\nworld");
        let srt = download(&client, &url, OutputFormat::Srt).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,200\nHello\n\n2\n"));
        mock.assert_hits(2);
    }

    #[test]
    fn missing_body_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/empty.json");
            then.status(200).json_body(json!({"body": null}));
        });
        let client = BiliClient::with_config(ClientConfig::default()).unwrap();
        let entries = fetch_entries(&client, &server.url("/empty.json")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn payload_http_error_is_transport() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone.json");
            then.status(404);
        });
        let client = BiliClient::with_config(ClientConfig::default()).unwrap();
        let err = fetch_entries(&client, &server.url("/gone.json")).unwrap_err();
        assert!(err.is_transport());
    }
}
