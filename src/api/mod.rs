use crate::{
    config::ResolverConfig,
    extractors,
    models::{ProviderMap, StreamBundle},
    resolver,
    utils::fetch::HttpFetcher,
};

/// Installs the `env_logger` backend, filtered by `RUST_LOG`. Safe to call more
/// than once.
pub fn init_logger() {
    let _ = env_logger::builder().format_timestamp_millis().try_init();
}

pub fn available_hosters() -> Vec<String> {
    extractors::available_hosters()
}

/// Takes the `{page url: provider}` JSON object and returns the stream bundle
/// as `{"streams": [label, url, ...]}`.
pub async fn extract_streams(providers_json: String) -> anyhow::Result<String> {
    let providers: ProviderMap = serde_json::from_str(&providers_json)?;
    let bundle = resolve_streams(providers).await?;
    Ok(serde_json::to_string(&bundle)?)
}

pub async fn resolve_streams(providers: ProviderMap) -> anyhow::Result<StreamBundle> {
    let config = ResolverConfig::default();
    let fetcher = HttpFetcher::new(&config)?;
    Ok(resolver::multi_extract(&fetcher, &config, &providers).await)
}

pub async fn extract_stream_url(providers_json: String) -> anyhow::Result<Option<String>> {
    let providers: ProviderMap = serde_json::from_str(&providers_json)?;
    let config = ResolverConfig::default();
    let fetcher = HttpFetcher::new(&config)?;
    Ok(resolver::first_stream(&fetcher, &config, &providers).await)
}
