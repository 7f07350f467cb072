
mod bigwarp;
mod doodstream;
mod filemoon;
mod mp4upload;
mod vidmoly;
mod vidoza;
mod voe;

use bigwarp::Bigwarp;
use doodstream::Doodstream;
use filemoon::Filemoon;
use mp4upload::Mp4upload;
use vidmoly::Vidmoly;
use vidoza::Vidoza;
use voe::Voe;

use std::{str::FromStr, sync::OnceLock};

use enum_dispatch::enum_dispatch;
use log::{debug, info};
use regex::Regex;
use strum::VariantNames;
use strum_macros::{EnumString, VariantNames};
use thiserror::Error;

use crate::{
    config::ResolverConfig,
    utils::{
        fetch::{Fetch, FetchError, FetchRequest},
        unpack::UnpackError,
    },
};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unknown provider: {0:?}")]
    UnknownProvider(String),
    #[error(transparent)]
    Unpack(#[from] UnpackError),
    #[error("[{0}] no stream found")]
    NoStreamFound(&'static str),
    #[error("[{hoster}] {what} not found")]
    MissingMarkup {
        hoster: &'static str,
        what: &'static str,
    },
    #[error("resolved url is not playable: {0:?}")]
    NotPlayable(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[enum_dispatch]
pub trait HosterDecoder {
    /// Headers sent with the page request (and its redirect hop).
    fn request_headers(&self, page_url: &str, user_agent: &str) -> Vec<(String, String)> {
        browser_headers(page_url, Some(user_agent))
    }

    /// Turns the fetched page into a single media url. `url` is the address the
    /// page was actually served from.
    async fn decode(
        &self,
        fetcher: &dyn Fetch,
        html: &str,
        url: &str,
    ) -> Result<String, ExtractError>;
}

#[enum_dispatch(HosterDecoder)]
#[derive(Debug, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum AllHosters {
    Bigwarp,
    Doodstream,
    Filemoon,
    Mp4upload,
    Vidmoly,
    Vidoza,
    Voe,
}

pub fn available_hosters() -> Vec<String> {
    AllHosters::VARIANTS.iter().map(|&s| s.to_owned()).collect()
}

pub fn get_hoster(name: &str) -> Result<AllHosters, ExtractError> {
    AllHosters::from_str(name).map_err(|_| ExtractError::UnknownProvider(name.to_owned()))
}

pub fn browser_headers(page_url: &str, user_agent: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![];
    if let Some(user_agent) = user_agent {
        headers.push(("User-Agent".to_owned(), user_agent.to_owned()));
    }
    headers.extend(
        [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Referer", page_url),
            ("Connection", "keep-alive"),
            ("x-Requested-With", "XMLHttpRequest"),
        ]
        .map(|(name, value)| (name.to_owned(), value.to_owned())),
    );
    headers
}

/// Runs the registered decoder for `provider` over an already fetched page.
pub async fn decode(
    fetcher: &dyn Fetch,
    provider: &str,
    html: &str,
    url: &str,
) -> Result<String, ExtractError> {
    get_hoster(provider)?.decode(fetcher, html, url).await
}

/// Fetches the hoster page (following one redirect hop at most) and decodes it.
pub async fn extract_stream_url_by_provider(
    fetcher: &dyn Fetch,
    config: &ResolverConfig,
    url: &str,
    provider: &str,
) -> Result<String, ExtractError> {
    let hoster = get_hoster(provider)?;
    let headers = hoster.request_headers(url, &config.user_agent);

    debug!("[{provider}] fetching {url}");
    let page = fetch_page(fetcher, url, &headers).await?;

    hoster.decode(fetcher, &page.html, &page.url).await
}

#[derive(Debug)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
}

pub async fn fetch_page(
    fetcher: &dyn Fetch,
    url: &str,
    headers: &[(String, String)],
) -> Result<FetchedPage, ExtractError> {
    let res = fetcher
        .fetch(FetchRequest::get(url).headers(headers.to_vec()))
        .await?;
    debug!("{url} responded with {}", res.status);
    let html = res.text();

    let Some(target) = find_redirect(&html) else {
        return Ok(FetchedPage {
            url: url.to_owned(),
            html,
        });
    };

    let target = url::Url::parse(url)
        .and_then(|base| base.join(&target))
        .map(|u| u.to_string())
        .unwrap_or(target);

    info!("following redirect {url} -> {target}");
    let res = fetcher
        .fetch(FetchRequest::get(&target).headers(headers.to_vec()))
        .await?;

    Ok(FetchedPage {
        url: target,
        html: res.text(),
    })
}

fn find_redirect(html: &str) -> Option<String> {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    static REDIRECT_RES: OnceLock<[Regex; 3]> = OnceLock::new();

    let title = TITLE_RE
        .get_or_init(|| Regex::new(r"<title>(?<title>.*?)</title>").unwrap())
        .captures(html)
        .and_then(|caps| Some(caps.name("title")?.as_str()))?;

    if !title.to_lowercase().contains("redirect") {
        return None;
    }

    let target = REDIRECT_RES
        .get_or_init(|| {
            [
                Regex::new(r#"<meta http-equiv="refresh" content="0;url=(?<url>.*?)""#).unwrap(),
                Regex::new(r#"window\.location\.href\s*=\s*["'](?<url>.*?)["']"#).unwrap(),
                Regex::new(r#"window\.location\.replace\s*\(\s*["'](?<url>.*?)["']\s*\)"#)
                    .unwrap(),
            ]
        })
        .iter()
        .find_map(|re| Some(re.captures(html)?.name("url")?.as_str().to_owned()));

    if target.is_none() {
        debug!("redirect page without a known redirect target");
    }

    target
}
