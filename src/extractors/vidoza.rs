use std::sync::OnceLock;

use regex::Regex;

use crate::utils::fetch::Fetch;

use super::{ExtractError, HosterDecoder};

#[derive(Debug, Default)]
pub struct Vidoza;

impl HosterDecoder for Vidoza {
    async fn decode(
        &self,
        _fetcher: &dyn Fetch,
        html: &str,
        _url: &str,
    ) -> Result<String, ExtractError> {
        static SOURCE_RE: OnceLock<Regex> = OnceLock::new();

        SOURCE_RE
            .get_or_init(|| Regex::new(r#"<source src="(?<src>[^"]+)" type='video/mp4'>"#).unwrap())
            .captures(html)
            .and_then(|m| Some(m.name("src")?.as_str().to_owned()))
            .ok_or(ExtractError::NoStreamFound("vidoza"))
    }
}
