//! Handler of throttled request operations.
//!
//! This module defines two structs, [`Client`] and [`ClientBuilder`].
//! `Client` owns the session resource, the throttle, and the quota
//! tracker, and exposes the single-call and batched request operations.
//! `ClientBuilder` exposes a finer level of granularity for building
//! a `Client`.

use std::sync::Mutex;

use futures::future::join_all;
use http::header::{self, HeaderMap, HeaderValue};
use log::warn;
use serde_json::Value;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    Addresses, ErrorKind, RequestDescriptor, ResponseResult, Result,
    quota::{QuotaKeys, QuotaTracker},
    ratelimit::{RateLimit, Throttle},
};

/// Default user agent, `spillway-<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("spillway/", env!("CARGO_PKG_VERSION"));

/// Builder for [`Client`].
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
pub struct ClientBuilder {
    /// Sets the default headers for every request.
    ///
    /// Typically carries authentication for the target API.
    custom_headers: HeaderMap,

    /// Throttle applied to the batched operations.
    ///
    /// `None` disables client-side throttling entirely; the server's
    /// quota headers are still honored.
    rate_limit: Option<RateLimit>,

    /// Header names used to extract quota information from responses.
    quota_keys: QuotaKeys,

    /// User-agent used for requests.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)")]
    user_agent: String,
}

impl Default for ClientBuilder {
    #[must_use]
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientBuilder {
    /// Instantiates a [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the user-agent is invalid.
    pub fn client(self) -> Result<Client> {
        let Self {
            custom_headers: mut headers,
            rate_limit,
            quota_keys,
            user_agent,
        } = self;

        headers.insert(header::USER_AGENT, HeaderValue::from_str(&user_agent)?);

        Ok(Client {
            headers,
            session: Mutex::new(None),
            throttle: rate_limit.map(Throttle::new),
            quota: QuotaTracker::new(quota_keys),
        })
    }
}

/// Handles single and batched requests against one API.
///
/// See [`ClientBuilder`] which contains sane defaults for all
/// configuration options.
///
/// One coordinated run is active per client at a time: all tasks of a
/// batch share the session resource read-mostly, and every task
/// relearns the quota counters from its own response.
#[derive(Debug)]
pub struct Client {
    /// Headers sent with every request
    headers: HeaderMap,

    /// Lazily created, reusable request session.
    ///
    /// Dropped by [`Client::release`] and recreated on demand, so the
    /// synchronous bridge can bind a fresh one to each of its runs.
    session: Mutex<Option<reqwest::Client>>,

    /// Rolling-window throttle shared by all tasks of a batch
    throttle: Option<Throttle>,

    /// Server-declared quota bookkeeping
    quota: QuotaTracker,
}

impl Client {
    /// Acquire the session, creating it on first use.
    ///
    /// The returned value is a cheap handle onto one shared connection
    /// pool, so every task of a batch reuses the same session.
    fn session(&self) -> Result<reqwest::Client> {
        let mut session = self.session.lock().unwrap();
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(self.headers.clone())
            .build()
            .map_err(ErrorKind::BuildRequestClient)?;
        *session = Some(client.clone());
        Ok(client)
    }

    /// Discard the session resource. The next request creates a fresh
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if the session mutex is poisoned
    pub fn release(&self) {
        self.session.lock().unwrap().take();
    }

    /// Read access to the quota tracker
    #[must_use]
    pub const fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    /// Perform a single guarded GET request and decode the JSON body.
    ///
    /// Unlike the batched operations this fails loud: quota exhaustion,
    /// transport failures, unexpected status codes, and undecodable
    /// bodies all propagate to the caller.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::QuotaExceeded`] before any transport I/O when the
    ///   server-declared quota is spent
    /// - [`ErrorKind::NetworkRequest`] on connection failure
    /// - [`ErrorKind::RejectedStatusCode`] on a non-2xx answer
    /// - [`ErrorKind::ReadResponseBody`] / [`ErrorKind::DecodeResponseBody`]
    ///   when the body cannot be read or parsed
    pub async fn get(&self, url: Url) -> Result<ResponseResult> {
        self.quota.check_remaining()?;
        let session = self.session()?;
        let response = session
            .get(url)
            .send()
            .await
            .map_err(ErrorKind::NetworkRequest)?;
        self.decode(response).await
    }

    /// Perform a single guarded POST request carrying a JSON `payload`.
    ///
    /// # Errors
    ///
    /// Same as [`Client::get`].
    pub async fn post(&self, url: Url, payload: &Value) -> Result<ResponseResult> {
        self.quota.check_remaining()?;
        let session = self.session()?;
        let response = session
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(ErrorKind::NetworkRequest)?;
        self.decode(response).await
    }

    /// Record the quota headers, then turn a received response into a
    /// decoded payload or a terminal error.
    async fn decode(&self, response: reqwest::Response) -> Result<ResponseResult> {
        // quota headers arrive on error responses too
        self.quota.update(response.headers());
        let status = response.status();
        if !status.is_success() {
            return Err(ErrorKind::RejectedStatusCode(status));
        }
        let body = response
            .text()
            .await
            .map_err(ErrorKind::ReadResponseBody)?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(value.into())
    }

    /// Fetch every URL concurrently under the shared throttle and quota
    /// guard.
    ///
    /// Results come back in input order: index `i` of the output belongs
    /// to `urls[i]` no matter which task finished first. A failing
    /// request degrades its own index to the uniform error shape (see
    /// [`ResponseResult`]) and never fails the batch.
    ///
    /// # Errors
    ///
    /// Returns an `Err` only if the session cannot be created; dispatch
    /// failures stay inside the batch.
    pub async fn process_gets(&self, urls: Vec<Url>) -> Result<Vec<ResponseResult>> {
        self.execute_batch(urls.into_iter().map(RequestDescriptor::get).collect())
            .await
    }

    /// Post every payload concurrently under the shared throttle and
    /// quota guard.
    ///
    /// A single address (or a one-element list) is broadcast over all
    /// payloads. Results come back in payload order, with per-index
    /// degradation as in [`Client::process_gets`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if a many-address list disagrees with the
    /// payload count, or the session cannot be created.
    pub async fn process_posts(
        &self,
        urls: impl Into<Addresses>,
        payloads: Vec<Value>,
    ) -> Result<Vec<ResponseResult>> {
        let urls = urls.into().pair_with(payloads.len())?;
        let batch = urls
            .into_iter()
            .zip(payloads)
            .map(|(url, payload)| RequestDescriptor::post(url, payload))
            .collect();
        self.execute_batch(batch).await
    }

    /// Run one batch: acquire the session once, dispatch every
    /// descriptor as its own task, join in input order, release the
    /// session.
    async fn execute_batch(&self, batch: Vec<RequestDescriptor>) -> Result<Vec<ResponseResult>> {
        let session = self.session()?;
        let tasks = batch
            .into_iter()
            .map(|descriptor| self.dispatch(session.clone(), descriptor));
        let results = join_all(tasks).await;
        self.release();
        Ok(results)
    }

    /// One task of a batch: quota guard, throttle admission, transport,
    /// quota update. Every failure collapses into the degraded result
    /// shape for this task alone.
    async fn dispatch(
        &self,
        session: reqwest::Client,
        descriptor: RequestDescriptor,
    ) -> ResponseResult {
        let RequestDescriptor { url, payload } = descriptor;

        if let Err(err) = self.quota.check_remaining() {
            warn!("skipping {url}: {err}");
            return ResponseResult::degraded(err);
        }
        if let Some(throttle) = &self.throttle {
            throttle.acquire().await;
        }

        let request = match payload {
            Some(ref payload) => session.post(url.clone()).json(payload),
            None => session.get(url.clone()),
        };
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("request to {url} failed: {err}");
                return ResponseResult::degraded(err);
            }
        };

        self.quota.update(response.headers());
        let status = response.status();
        if !status.is_success() {
            warn!("request to {url} answered {status}");
            let reason = status.canonical_reason().unwrap_or_else(|| status.as_str());
            return ResponseResult::degraded(reason);
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!("cannot read body from {url}: {err}");
                return ResponseResult::degraded(err);
            }
        };
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => value.into(),
            Err(err) => {
                warn!("undecodable body from {url}: {err}");
                ResponseResult::degraded(err)
            }
        }
    }
}
