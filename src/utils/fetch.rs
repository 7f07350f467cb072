use futures::future::BoxFuture;
use log::debug;
use reqwest::Method;
use thiserror::Error;

use crate::config::ResolverConfig;

use super::create_client_builder;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    /// Kept as sent, header name casing included.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: vec![],
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct FetchResponse {
    pub status: u16,
    body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(self) -> String {
        self.body
    }
}

#[derive(Debug, Error)]
#[error("fetch {url} failed: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(url: &str, reason: impl ToString) -> Self {
        Self {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Network primitive used by every hoster decoder.
pub trait Fetch: Send + Sync {
    fn fetch<'a>(&'a self, request: FetchRequest)
        -> BoxFuture<'a, Result<FetchResponse, FetchError>>;
}

/// `reqwest` implementation: the enhanced client (cookies, custom dns, default
/// headers) goes first, a bare client is the fallback.
pub struct HttpFetcher {
    enhanced: reqwest::Client,
    plain: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ResolverConfig) -> anyhow::Result<Self> {
        Ok(Self {
            enhanced: create_client_builder(config).build()?,
            plain: reqwest::Client::builder().build()?,
        })
    }
}

async fn send(client: &reqwest::Client, request: &FetchRequest) -> reqwest::Result<FetchResponse> {
    let mut builder = client.request(request.method.clone(), &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    let res = builder.send().await?;
    let status = res.status().as_u16();
    let body = res.text().await?;

    Ok(FetchResponse::new(status, body))
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        request: FetchRequest,
    ) -> BoxFuture<'a, Result<FetchResponse, FetchError>> {
        Box::pin(async move {
            match send(&self.enhanced, &request).await {
                Ok(res) => Ok(res),
                Err(err) => {
                    debug!("enhanced fetch of {} failed: {err}", request.url);
                    send(&self.plain, &request)
                        .await
                        .map_err(|err| FetchError::new(&request.url, err))
                }
            }
        })
    }
}
