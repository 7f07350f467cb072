use std::sync::OnceLock;

use regex::Regex;

use crate::utils::fetch::Fetch;

use super::{browser_headers, ExtractError, HosterDecoder};

#[derive(Debug, Default)]
pub struct Bigwarp;

impl HosterDecoder for Bigwarp {
    // no user agent, lowercase x-requested-with
    fn request_headers(&self, page_url: &str, _user_agent: &str) -> Vec<(String, String)> {
        browser_headers(page_url, None)
            .into_iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("x-requested-with") {
                    (name.to_lowercase(), value)
                } else {
                    (name, value)
                }
            })
            .collect()
    }

    async fn decode(
        &self,
        _fetcher: &dyn Fetch,
        html: &str,
        _url: &str,
    ) -> Result<String, ExtractError> {
        static SOURCES_RE: OnceLock<Regex> = OnceLock::new();

        SOURCES_RE
            .get_or_init(|| Regex::new(r#"sources:\s*\[\{file:"(?<file>[^"]+)""#).unwrap())
            .captures(html)
            .and_then(|caps| Some(caps.name("file")?.as_str().to_owned()))
            .ok_or(ExtractError::NoStreamFound("bigwarp"))
    }
}
