use std::sync::OnceLock;

use regex::Regex;

use crate::utils::fetch::Fetch;

use super::{ExtractError, HosterDecoder};

#[derive(Debug, Default)]
pub struct Mp4upload;

impl HosterDecoder for Mp4upload {
    async fn decode(
        &self,
        _fetcher: &dyn Fetch,
        html: &str,
        _url: &str,
    ) -> Result<String, ExtractError> {
        static SRC_REGEXP: OnceLock<Regex> = OnceLock::new();

        SRC_REGEXP
            .get_or_init(|| Regex::new(r#"src:\s*"(?<src>[^"]+)""#).unwrap())
            .captures(html)
            .and_then(|m| Some(m.name("src")?.as_str().to_owned()))
            .ok_or(ExtractError::NoStreamFound("mp4upload"))
    }
}
