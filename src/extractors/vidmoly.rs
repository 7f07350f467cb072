use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;

use crate::utils::{
    fetch::{Fetch, FetchRequest},
    text,
    unpack::decode_base64,
};

use super::{ExtractError, HosterDecoder};

/// Player options in lookup order.
const OMEGA_OPTIONS: [&str; 3] = ["SUB - Omega", "Omega", "SUB v2 - Omega"];

#[derive(Debug, Default)]
pub struct Vidmoly;

impl HosterDecoder for Vidmoly {
    async fn decode(
        &self,
        fetcher: &dyn Fetch,
        html: &str,
        _url: &str,
    ) -> Result<String, ExtractError> {
        static OPTION_RES: OnceLock<Vec<Regex>> = OnceLock::new();
        static IFRAME_RE: OnceLock<Regex> = OnceLock::new();
        static M3U8_RE: OnceLock<Regex> = OnceLock::new();

        let maybe_option = OPTION_RES
            .get_or_init(|| {
                OMEGA_OPTIONS
                    .iter()
                    .map(|label| {
                        Regex::new(&format!(
                            r#"<option value="(?<value>[^"]+)"[^>]*>\s*{}\s*</option>"#,
                            regex::escape(label)
                        ))
                        .unwrap()
                    })
                    .collect()
            })
            .iter()
            .find_map(|re| Some(re.captures(html)?.name("value")?.as_str()));

        let Some(encoded) = maybe_option else {
            debug!("[vidmoly] no omega option, scanning page sources");
            return direct_sources(html);
        };

        let decoded = decode_base64(encoded).map_err(|_| ExtractError::MissingMarkup {
            hoster: "vidmoly",
            what: "base64 player option",
        })?;
        let decoded = String::from_utf8_lossy(&decoded);

        let iframe_src = IFRAME_RE
            .get_or_init(|| Regex::new(r#"<iframe\s+src="(?<src>[^"]+)""#).unwrap())
            .captures(&decoded)
            .and_then(|caps| Some(caps.name("src")?.as_str()))
            .ok_or(ExtractError::MissingMarkup {
                hoster: "vidmoly",
                what: "player iframe",
            })?;

        let player_url = text::to_full_url(iframe_src);
        info!("[vidmoly] loading player {player_url}");
        let player_html = fetcher.fetch(FetchRequest::get(player_url)).await?.text();

        M3U8_RE
            .get_or_init(|| Regex::new(r#"sources:\s*\[\{file:"(?<file>[^"]+\.m3u8)""#).unwrap())
            .captures(&player_html)
            .and_then(|caps| Some(caps.name("file")?.as_str().to_owned()))
            .ok_or(ExtractError::NoStreamFound("vidmoly"))
    }
}

fn direct_sources(html: &str) -> Result<String, ExtractError> {
    static SOURCES_RE: OnceLock<Regex> = OnceLock::new();

    SOURCES_RE
        .get_or_init(|| Regex::new(r#"sources:\s*\[\{file:"(?<file>https?://[^"]+)"\}"#).unwrap())
        .captures(html)
        .and_then(|caps| Some(caps.name("file")?.as_str().to_owned()))
        .ok_or(ExtractError::NoStreamFound("vidmoly"))
}
