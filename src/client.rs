use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use tracing::debug;

use crate::context::Context;
use crate::error::{Error, Result};

/// How often a caller waiting on a request looks at its context.
const CANCEL_POLL: Duration = Duration::from_millis(10);

/// Performs one GET against the API for the given path suffix.
pub trait RemoteClient: Send + Sync {
    fn get(&self, ctx: &Context, suffix: &str) -> Result<Vec<u8>>;
}

pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

/// A transport error caused by the context deadline is reported as such.
fn transport_error(ctx: &Context, err: reqwest::Error) -> Error {
    if err.is_timeout() && ctx.remaining().is_some_and(|left| left.is_zero()) {
        Error::DeadlineExceeded
    } else {
        Error::Network(err)
    }
}

/// Sends the request and reads the whole body. Runs on the request thread.
fn execute(ctx: &Context, request: RequestBuilder) -> Result<Vec<u8>> {
    let response = request.send().map_err(|e| transport_error(ctx, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }

    let body = response.bytes().map_err(|e| transport_error(ctx, e))?;
    Ok(body.to_vec())
}

impl RemoteClient for HttpClient {
    fn get(&self, ctx: &Context, suffix: &str) -> Result<Vec<u8>> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let url = format!("{}/{}", self.base_url, suffix);
        // The context deadline bounds the request even while it is in flight.
        let timeout = match ctx.remaining() {
            Some(left) => left.min(self.timeout),
            None => self.timeout,
        };

        debug!(suffix, %url, ?timeout, "GET");
        let request = self.client.get(&url).timeout(timeout);

        // A blocking request cannot be interrupted, so it runs on its own thread while this one
        // watches the context. An abandoned request thread ends once its timeout fires.
        let (tx, rx) = mpsc::channel();
        let request_ctx = ctx.clone();
        thread::Builder::new()
            .name("hn-request".to_string())
            .spawn(move || {
                let _ = tx.send(execute(&request_ctx, request));
            })?;

        loop {
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(result) => {
                    let body = result?;
                    if let Some(err) = ctx.err() {
                        return Err(err);
                    }
                    return Ok(body);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(err) = ctx.err() {
                        debug!(suffix, %err, "abandoning request");
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Remote(format!("request thread for {suffix} exited")));
                }
            }
        }
    }
}
