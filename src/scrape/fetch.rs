// src/scrape/fetch.rs
//! Polite HTTP GET.
//!
//! Every call sleeps for the configured delay first, then issues exactly one
//! request. Non-2xx statuses and transport errors come back as
//! [`FetchFailure`]; retries are not attempted here.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use crate::config::FetchSettings;
use crate::error::{FetchFailure, FetchFailureReason};

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects; block detection inspects it.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<FetchedPage, FetchFailure>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<FetchedPage, FetchFailure> {
        (**self).fetch(url, params).await
    }
}

/// `reqwest` session with a cookie store and pooled connections. Each adapter
/// owns one; sessions are never shared between platforms.
pub struct HttpFetcher {
    client: Client,
    settings: FetchSettings,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent).context("invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language).context("invalid accept-language")?,
        );

        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("building http client")?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, params: &[(&str, &str)]) -> Result<FetchedPage, FetchFailure> {
        if !self.settings.delay.is_zero() {
            tokio::time::sleep(self.settings.delay).await;
        }

        let mut req = self.client.get(url);
        if !params.is_empty() {
            req = req.query(params);
        }

        let resp = req.send().await.map_err(|e| {
            counter!("shopper_fetch_failures_total").increment(1);
            FetchFailure::from_reqwest(url, &e)
        })?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            counter!("shopper_fetch_failures_total").increment(1);
            return Err(FetchFailure::new(
                final_url,
                FetchFailureReason::Status(status.as_u16()),
            ));
        }

        let body = resp.text().await.map_err(|e| {
            counter!("shopper_fetch_failures_total").increment(1);
            FetchFailure::new(url, FetchFailureReason::Body(e.to_string()))
        })?;

        tracing::debug!(target: "scrape", url = %final_url, bytes = body.len(), "fetched");
        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Serves one canned response for every URL and remembers what was asked for.
pub struct StaticFetcher {
    response: Result<FetchedPage, FetchFailureReason>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn page(body: impl Into<String>) -> Self {
        Self {
            response: Ok(FetchedPage {
                final_url: String::new(),
                status: 200,
                body: body.into(),
            }),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Pretend the request was redirected to `final_url`.
    pub fn redirected(final_url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut f = Self::page(body);
        if let Ok(page) = &mut f.response {
            page.final_url = final_url.into();
        }
        f
    }

    pub fn failing(reason: FetchFailureReason) -> Self {
        Self {
            response: Err(reason),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str, _params: &[(&str, &str)]) -> Result<FetchedPage, FetchFailure> {
        if let Ok(mut v) = self.requested.lock() {
            v.push(url.to_string());
        }
        match &self.response {
            Ok(page) => {
                let mut page = page.clone();
                if page.final_url.is_empty() {
                    page.final_url = url.to_string();
                }
                Ok(page)
            }
            Err(reason) => Err(FetchFailure::new(url, reason.clone())),
        }
    }
}
