pub mod dns;
pub mod fetch;
pub mod text;
pub mod unpack;

use std::{sync::Arc, time::Duration};

use dns::HosterDnsResolver;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    ClientBuilder,
};

use crate::config::ResolverConfig;

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0"
}

/// Builder for the "enhanced" client. No user agent is set here,
/// hoster requests carry their own header set.
pub fn create_client_builder(config: &ResolverConfig) -> reqwest::ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .danger_accept_invalid_certs(true)
        .cookie_store(true)
        .dns_resolver(Arc::new(HosterDnsResolver::default()))
        .default_headers(get_default_headers())
}

pub fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::default();

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}
