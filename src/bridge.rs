//! Synchronous bridge into the request engine.
//!
//! Callers that cannot run a concurrency coordinator of their own hand
//! one operation to [`Client::pipeline`], which spins up a dedicated
//! execution context, runs the operation to completion, and tears the
//! context down again.

use std::future::Future;

use log::error;
use tokio::runtime;

use crate::{Client, Result};

impl Client {
    /// Run one async operation to completion from synchronous code.
    ///
    /// A fresh single-threaded runtime is created for the call and torn
    /// down afterwards together with the session resource, so repeated
    /// invocations never leak execution contexts or connections. The
    /// session the operation sees is always a fresh one bound to the
    /// new runtime.
    ///
    /// An `Err` from the operation is reported on the error log and
    /// swallowed; the bridge then yields `None`. Whether `None` means
    /// "failed" or "nothing came back" is deliberately left to the
    /// caller, who can inspect the log when it matters. The client
    /// stays usable for the next invocation either way.
    ///
    /// Must not be called from within an async runtime; async callers
    /// use the request operations directly.
    ///
    /// ```no_run
    /// use spillway::ClientBuilder;
    /// use url::Url;
    ///
    /// let client = ClientBuilder::default().client().unwrap();
    /// let urls = vec![Url::parse("https://api.example.com/items/1").unwrap()];
    /// let results = client.pipeline(|c| c.process_gets(urls));
    /// ```
    pub fn pipeline<'c, F, Fut, T>(&'c self, operation: F) -> Option<T>
    where
        F: FnOnce(&'c Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // the session must not outlive the context it was created on
        self.release();
        let runtime = match runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("cannot create bridge runtime: {err}");
                return None;
            }
        };
        let result = match runtime.block_on(operation(self)) {
            Ok(value) => Some(value),
            Err(err) => {
                error!("pipeline operation failed: {err}");
                None
            }
        };
        drop(runtime);
        self.release();
        result
    }
}
