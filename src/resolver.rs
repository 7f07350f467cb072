use std::collections::HashMap;

use futures::StreamExt;
use log::{debug, info, warn};

use crate::{
    config::ResolverConfig,
    extractors::{self, ExtractError},
    models::{DecodedStream, ProviderFailure, ProviderMap, Resolution, StreamBundle},
    utils::{fetch::Fetch, text},
};

const DIRECT_LABEL: &str = "Direct";

/// Parsed provider identifier from a [`ProviderMap`] value.
#[derive(Debug, PartialEq, Eq)]
pub enum ProviderId<'a> {
    /// `direct` or `direct-<label>`: the page url is already the stream.
    Direct { label: &'a str },
    /// `<name>` or `<name>-<custom name>`.
    Hoster {
        name: &'a str,
        custom_name: Option<&'a str>,
    },
}

impl<'a> ProviderId<'a> {
    pub fn parse(id: &'a str) -> Self {
        if id == "direct" {
            return Self::Direct {
                label: DIRECT_LABEL,
            };
        }

        if let Some(label) = id.strip_prefix("direct-") {
            return Self::Direct {
                label: if label.is_empty() { DIRECT_LABEL } else { label },
            };
        }

        match id.split_once('-') {
            Some((name, custom_name)) => Self::Hoster {
                name,
                custom_name: Some(custom_name).filter(|n| !n.is_empty()),
            },
            None => Self::Hoster {
                name: id,
                custom_name: None,
            },
        }
    }
}

#[derive(Default)]
struct Accumulator {
    streams: Vec<DecodedStream>,
    /// Successes per base hoster name, checked against the cap.
    successes: HashMap<String, usize>,
    /// Successes per effective label, used for the `-N` suffix.
    labels: HashMap<String, usize>,
    failures: Vec<ProviderFailure>,
}

impl Accumulator {
    fn successes(&self, hoster: &str) -> usize {
        self.successes.get(hoster).copied().unwrap_or_default()
    }

    fn push_stream(&mut self, hoster: &str, custom_name: Option<&str>, url: String) {
        *self.successes.entry(hoster.to_owned()).or_default() += 1;

        let name = custom_name.unwrap_or(hoster);
        let previous = self.labels.entry(name.to_owned()).or_default();
        let label = match *previous {
            0 => text::capitalize(name),
            n => format!("{}-{n}", text::capitalize(name)),
        };
        *previous += 1;

        self.streams.push(DecodedStream::new(label, url));
    }

    fn push_failure(&mut self, url: &str, provider: &str, error: ExtractError) {
        warn!("[{provider}] {url} skipped: {error}");
        self.failures.push(ProviderFailure {
            url: url.to_owned(),
            provider: provider.to_owned(),
            error,
        });
    }
}

async fn resolve_hoster(
    fetcher: &dyn Fetch,
    config: &ResolverConfig,
    url: &str,
    hoster: &str,
) -> Result<String, ExtractError> {
    let stream_url =
        extractors::extract_stream_url_by_provider(fetcher, config, url, hoster).await?;

    if text::is_playable_url(&stream_url) {
        Ok(stream_url)
    } else {
        Err(ExtractError::NotPlayable(stream_url))
    }
}

/// Resolves every entry in map order, keeping per-provider failures.
///
/// Hosters are decoded one at a time. A base hoster stops being decoded once it
/// has contributed `max_streams_per_provider` streams.
pub async fn resolve_all(
    fetcher: &dyn Fetch,
    config: &ResolverConfig,
    providers: &ProviderMap,
) -> Resolution {
    let acc = futures::stream::iter(providers)
        .fold(Accumulator::default(), |mut acc, (url, provider)| async move {
            match ProviderId::parse(provider) {
                ProviderId::Direct { label } => {
                    debug!("[direct] passing {url} through as {label}");
                    acc.streams.push(DecodedStream::new(label, url.as_str()));
                }
                ProviderId::Hoster { name, custom_name } => {
                    let successes = acc.successes(name);
                    if successes >= config.max_streams_per_provider {
                        debug!("[{name}] already has {successes} streams, skipping {url}");
                        return acc;
                    }

                    match resolve_hoster(fetcher, config, url, name).await {
                        Ok(stream_url) => {
                            info!("[{name}] resolved {url} -> {stream_url}");
                            acc.push_stream(name, custom_name, stream_url);
                        }
                        Err(err) => acc.push_failure(url, provider, err),
                    }
                }
            }
            acc
        })
        .await;

    Resolution {
        bundle: StreamBundle {
            streams: acc.streams,
        },
        failures: acc.failures,
    }
}

/// Ordered, labelled streams for every provider entry that resolved.
pub async fn multi_extract(
    fetcher: &dyn Fetch,
    config: &ResolverConfig,
    providers: &ProviderMap,
) -> StreamBundle {
    resolve_all(fetcher, config, providers).await.bundle
}

/// First playable stream url, trying providers in map order. Stops at the
/// first success.
pub async fn first_stream(
    fetcher: &dyn Fetch,
    config: &ResolverConfig,
    providers: &ProviderMap,
) -> Option<String> {
    for (url, provider) in providers {
        let res = match ProviderId::parse(provider) {
            ProviderId::Direct { .. } if text::is_playable_url(url) => return Some(url.clone()),
            ProviderId::Direct { .. } => Err(ExtractError::NotPlayable(url.clone())),
            ProviderId::Hoster { name, .. } => resolve_hoster(fetcher, config, url, name).await,
        };

        match res {
            Ok(stream_url) => {
                info!("[{provider}] selected {stream_url}");
                return Some(stream_url);
            }
            Err(err) => warn!("[{provider}] {url} skipped: {err}"),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::utils::fetch::mock::MockFetcher;

    use super::*;

    fn providers(entries: &[(&str, &str)]) -> ProviderMap {
        entries
            .iter()
            .map(|&(url, provider)| (url.to_owned(), provider.to_owned()))
            .collect()
    }

    fn mp4upload_page(n: usize) -> String {
        format!(r#"player.src({{ type: "video/mp4", src: "https://s{n}.mp4upload.com/v.mp4" }});"#)
    }

    #[test]
    fn should_parse_provider_ids() {
        assert_eq!(
            ProviderId::parse("direct"),
            ProviderId::Direct { label: "Direct" }
        );
        assert_eq!(
            ProviderId::parse("direct-"),
            ProviderId::Direct { label: "Direct" }
        );
        assert_eq!(
            ProviderId::parse("direct-My-CDN"),
            ProviderId::Direct { label: "My-CDN" }
        );
        assert_eq!(
            ProviderId::parse("voe"),
            ProviderId::Hoster {
                name: "voe",
                custom_name: None
            }
        );
        assert_eq!(
            ProviderId::parse("voe-Backup-2"),
            ProviderId::Hoster {
                name: "voe",
                custom_name: Some("Backup-2")
            }
        );
        assert_eq!(
            ProviderId::parse("voe-"),
            ProviderId::Hoster {
                name: "voe",
                custom_name: None
            }
        );
        assert_eq!(
            ProviderId::parse("directvoe"),
            ProviderId::Hoster {
                name: "directvoe",
                custom_name: None
            }
        );
    }

    #[test_log::test(tokio::test)]
    async fn should_cap_streams_per_provider() {
        let mut fetcher = MockFetcher::default();
        let mut entries = vec![];
        for n in 0..5 {
            let url = format!("https://www.mp4upload.com/embed-{n}.html");
            fetcher = fetcher.with_page(&url, mp4upload_page(n));
            entries.push((url, "mp4upload".to_owned()));
        }
        let map: ProviderMap = entries.into_iter().collect();

        let bundle = multi_extract(&fetcher, &ResolverConfig::default(), &map).await;

        assert_eq!(bundle.labels(), ["Mp4upload", "Mp4upload-1", "Mp4upload-2"]);
        assert_eq!(bundle.streams[2].url, "https://s2.mp4upload.com/v.mp4");
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn should_respect_configured_cap() {
        let fetcher = MockFetcher::default()
            .with_page("https://a.example/1", mp4upload_page(1))
            .with_page("https://a.example/2", mp4upload_page(2));
        let config = ResolverConfig {
            max_streams_per_provider: 1,
            ..Default::default()
        };

        let bundle = multi_extract(
            &fetcher,
            &config,
            &providers(&[
                ("https://a.example/1", "mp4upload"),
                ("https://a.example/2", "mp4upload"),
            ]),
        )
        .await;

        assert_eq!(bundle.labels(), ["Mp4upload"]);
        assert_eq!(fetcher.requested_urls(), ["https://a.example/1"]);
    }

    #[tokio::test]
    async fn should_pass_direct_streams_through() {
        let fetcher = MockFetcher::default();

        let bundle = multi_extract(
            &fetcher,
            &ResolverConfig::default(),
            &providers(&[
                ("https://cdn.example/a.m3u8", "direct-MyCDN"),
                ("https://cdn.example/b.m3u8", "direct"),
            ]),
        )
        .await;

        assert_eq!(
            bundle.streams,
            [
                DecodedStream::new("MyCDN", "https://cdn.example/a.m3u8"),
                DecodedStream::new("Direct", "https://cdn.example/b.m3u8"),
            ]
        );
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn should_skip_unknown_provider() {
        let fetcher = MockFetcher::default().with_page(
            "https://vidoza.net/e/1",
            r#"<source src="https://str.vidoza.net/v.mp4" type='video/mp4'>"#,
        );

        let res = resolve_all(
            &fetcher,
            &ResolverConfig::default(),
            &providers(&[
                ("https://acme.example/e/1", "acme"),
                ("https://vidoza.net/e/1", "vidoza"),
            ]),
        )
        .await;

        assert_eq!(res.bundle.labels(), ["Vidoza"]);
        assert_eq!(res.failures.len(), 1);
        assert_eq!(res.failures[0].provider, "acme");
        assert!(matches!(
            &res.failures[0].error,
            ExtractError::UnknownProvider(name) if name == "acme"
        ));
        assert_eq!(fetcher.requested_urls(), ["https://vidoza.net/e/1"]);
    }

    #[tokio::test]
    async fn should_label_custom_names_and_keep_order() {
        let fetcher = MockFetcher::default()
            .with_page("https://z.example/1", mp4upload_page(1))
            .with_page("https://a.example/2", mp4upload_page(2))
            .with_page("https://m.example/3", mp4upload_page(3));

        let bundle = multi_extract(
            &fetcher,
            &ResolverConfig::default(),
            &providers(&[
                ("https://z.example/1", "mp4upload-Backup"),
                ("https://cdn.example/x.m3u8", "direct-CDN"),
                ("https://a.example/2", "mp4upload"),
                ("https://m.example/3", "mp4upload-Backup"),
            ]),
        )
        .await;

        assert_eq!(bundle.labels(), ["Backup", "CDN", "Mp4upload", "Backup-1"]);
        assert_eq!(
            serde_json::to_value(&bundle).unwrap()["streams"][3],
            "https://cdn.example/x.m3u8"
        );
    }

    #[tokio::test]
    async fn should_keep_labels_unique_across_hosters() {
        let fetcher = MockFetcher::default()
            .with_page("https://a.example/e", mp4upload_page(1))
            .with_page(
                "https://b.example/e",
                r#"<source src="https://str.vidoza.net/v.mp4" type='video/mp4'>"#,
            )
            .with_page("https://c.example/e", mp4upload_page(2));

        let bundle = multi_extract(
            &fetcher,
            &ResolverConfig::default(),
            &providers(&[
                ("https://a.example/e", "mp4upload-backup"),
                ("https://b.example/e", "vidoza-backup"),
                ("https://c.example/e", "mp4upload"),
            ]),
        )
        .await;

        assert_eq!(bundle.labels(), ["Backup", "Backup-1", "Mp4upload"]);
    }

    #[tokio::test]
    async fn should_cap_overridden_streams_by_hoster() {
        let fetcher = MockFetcher::default()
            .with_page("https://a.example/1", mp4upload_page(1))
            .with_page("https://a.example/2", mp4upload_page(2))
            .with_page("https://a.example/3", mp4upload_page(3));
        let config = ResolverConfig {
            max_streams_per_provider: 2,
            ..Default::default()
        };

        let bundle = multi_extract(
            &fetcher,
            &config,
            &providers(&[
                ("https://a.example/1", "mp4upload-one"),
                ("https://a.example/2", "mp4upload-two"),
                ("https://a.example/3", "mp4upload"),
            ]),
        )
        .await;

        assert_eq!(bundle.labels(), ["One", "Two"]);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn should_record_failed_and_unplayable_streams() {
        let fetcher = MockFetcher::default().with_page(
            "https://mp4upload.com/e/1",
            r#"src: "/relative/v.mp4""#,
        );

        let res = resolve_all(
            &fetcher,
            &ResolverConfig::default(),
            &providers(&[
                ("https://mp4upload.com/e/1", "mp4upload"),
                ("https://voe.sx/e/dead", "voe"),
            ]),
        )
        .await;

        assert!(res.bundle.is_empty());
        assert!(matches!(
            &res.failures[0].error,
            ExtractError::NotPlayable(url) if url == "/relative/v.mp4"
        ));
        assert!(matches!(&res.failures[1].error, ExtractError::Fetch(_)));
    }

    #[test_log::test(tokio::test)]
    async fn should_stop_at_first_stream() {
        let fetcher = MockFetcher::default()
            .with_page("https://b.example/e", r#"src: "https://x""#)
            .with_page("https://c.example/e", r#"src: "https://y""#);

        let res = first_stream(
            &fetcher,
            &ResolverConfig::default(),
            &providers(&[
                ("https://a.example/e", "mp4upload"),
                ("https://b.example/e", "mp4upload"),
                ("https://c.example/e", "mp4upload"),
            ]),
        )
        .await;

        assert_eq!(res.as_deref(), Some("https://x"));
        assert_eq!(
            fetcher.requested_urls(),
            ["https://a.example/e", "https://b.example/e"]
        );
    }

    #[tokio::test]
    async fn should_select_direct_url_and_handle_empty_map() {
        let fetcher = MockFetcher::default();
        let config = ResolverConfig::default();

        let res = first_stream(
            &fetcher,
            &config,
            &providers(&[
                ("https://acme.example/e", "acme"),
                ("https://cdn.example/v.m3u8", "direct-CDN"),
            ]),
        )
        .await;
        assert_eq!(res.as_deref(), Some("https://cdn.example/v.m3u8"));

        assert_eq!(first_stream(&fetcher, &config, &ProviderMap::new()).await, None);
        assert!(fetcher.requests().is_empty());
    }
}
