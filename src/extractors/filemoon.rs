use std::sync::OnceLock;

use log::{debug, info};
use regex::{Regex, RegexBuilder};

use crate::utils::{
    fetch::{Fetch, FetchRequest},
    text,
    unpack::packerjs,
};

use super::{ExtractError, HosterDecoder};

#[derive(Debug, Default)]
pub struct Filemoon;

impl HosterDecoder for Filemoon {
    async fn decode(
        &self,
        fetcher: &dyn Fetch,
        html: &str,
        url: &str,
    ) -> Result<String, ExtractError> {
        static IFRAME_RE: OnceLock<Regex> = OnceLock::new();
        static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
        static EVAL_RE: OnceLock<Regex> = OnceLock::new();
        static MASTER_RE: OnceLock<Regex> = OnceLock::new();

        let maybe_iframe = IFRAME_RE
            .get_or_init(|| Regex::new(r#"<iframe[^>]+src="(?<src>[^"]+)"[^>]*></iframe>"#).unwrap())
            .captures(html)
            .and_then(|caps| Some(caps.name("src")?.as_str()));

        let page = match maybe_iframe {
            Some(src) => {
                let iframe_url = text::to_full_url(src);
                info!("[filemoon] following iframe {iframe_url}");
                let res = fetcher
                    .fetch(
                        FetchRequest::get(iframe_url)
                            .header("User-Agent", crate::utils::get_user_agent())
                            .header(
                                "Accept",
                                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
                            )
                            .header("Referer", url),
                    )
                    .await?;
                res.text()
            }
            None => html.to_owned(),
        };

        let eval_re = EVAL_RE.get_or_init(|| Regex::new(r"eval\((.*?)\)").unwrap());
        let packed_script = SCRIPT_RE
            .get_or_init(|| {
                RegexBuilder::new(r"<script[^>]*>(?<body>.*?)</script>")
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .build()
                    .unwrap()
            })
            .captures_iter(&page)
            .filter_map(|caps| Some(caps.name("body")?.as_str()))
            .find(|script| eval_re.is_match(script) && script.contains("m3u8"))
            .ok_or(ExtractError::MissingMarkup {
                hoster: "filemoon",
                what: "packed player script",
            })?;

        let unpacked = packerjs::unpack(packed_script)?;
        debug!("[filemoon] unpacked {} chars", unpacked.len());

        MASTER_RE
            .get_or_init(|| Regex::new(r#"https?://[^\s]+master\.m3u8[^\s]*?(\?[^"]*)?"#).unwrap())
            .find(&unpacked)
            .map(|m| m.as_str().to_owned())
            .ok_or(ExtractError::NoStreamFound("filemoon"))
    }
}
