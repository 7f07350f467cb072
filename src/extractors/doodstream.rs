use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::utils::{
    fetch::{Fetch, FetchRequest},
    text,
};

use super::{ExtractError, HosterDecoder};

const RND_STRING_LEN: usize = 10;

#[derive(Debug, Default)]
pub struct Doodstream;

impl HosterDecoder for Doodstream {
    async fn decode(
        &self,
        fetcher: &dyn Fetch,
        html: &str,
        url: &str,
    ) -> Result<String, ExtractError> {
        static MD5_PASS_RE: OnceLock<Regex> = OnceLock::new();

        let origin = url::Url::parse(url)
            .map(|u| u.origin().ascii_serialization())
            .map_err(|_| ExtractError::MissingMarkup {
                hoster: "doodstream",
                what: "stream domain",
            })?;

        let md5_path = MD5_PASS_RE
            .get_or_init(|| Regex::new(r"'/pass_md5/(?<path>[^']*)',").unwrap())
            .captures(html)
            .and_then(|caps| Some(caps.name("path")?.as_str()))
            .ok_or(ExtractError::MissingMarkup {
                hoster: "doodstream",
                what: "pass_md5 path",
            })?;

        let token = md5_path.rsplit('/').next().unwrap_or(md5_path);
        let expiry = chrono::Utc::now().timestamp_millis();

        let pass_res = fetcher
            .fetch(FetchRequest::get(format!("{origin}/pass_md5/{md5_path}")).header("Referer", url))
            .await?;
        debug!("[doodstream] pass_md5 responded with {}", pass_res.status);
        let media_link_part = pass_res.text();

        let random = text::random_string(RND_STRING_LEN);
        Ok(format!(
            "{media_link_part}{random}?token={token}&expiry={expiry}"
        ))
    }
}
