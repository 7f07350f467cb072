use std::sync::OnceLock;

use log::debug;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::utils::{fetch::Fetch, text, unpack::obfuscated_json};

use super::{ExtractError, HosterDecoder};

#[derive(Debug, Default)]
pub struct Voe;

impl HosterDecoder for Voe {
    async fn decode(
        &self,
        _fetcher: &dyn Fetch,
        html: &str,
        _url: &str,
    ) -> Result<String, ExtractError> {
        static JSON_SCRIPT_RE: OnceLock<Regex> = OnceLock::new();

        let raw_json = JSON_SCRIPT_RE
            .get_or_init(|| {
                RegexBuilder::new(
                    r#"<script[^>]+type=["']application/json["'][^>]*>(?<json>.*?)</script>"#,
                )
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .unwrap()
            })
            .captures(html)
            .and_then(|caps| Some(caps.name("json")?.as_str()))
            .ok_or(ExtractError::NoStreamFound("voe"))?;

        let payload = obfuscated_json::decode_payload(raw_json)?;
        debug!("[voe] decoded payload: {payload}");

        stream_url(&payload).ok_or(ExtractError::NoStreamFound("voe"))
    }
}

fn stream_url(payload: &Value) -> Option<String> {
    if let Some(direct) = payload.get("direct_access_url").and_then(Value::as_str) {
        if !direct.is_empty() {
            return Some(direct.to_owned());
        }
    }

    payload
        .get("source")?
        .as_array()?
        .iter()
        .filter_map(|source| source.get("direct_access_url")?.as_str())
        .find(|url| text::is_playable_url(url))
        .map(str::to_owned)
}
