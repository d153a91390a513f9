//! Streaming Request
//!
//! Opens a server-sent-event style HTTP response and hands its body to a
//! registered connection.

use bytes::Bytes;
use futures::Stream;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::StreamError;
use crate::stream::{Connection, StreamCallbacks, StreamOutcome};

// == Open Stream ==
/// POSTs `body` as JSON to `url` and returns the response byte stream.
///
/// Non-success responses are turned into `StreamError::Status`, using the JSON
/// `detail` field of the error body when the server provides one.
pub async fn open_stream<T>(
    client: &Client,
    url: &str,
    body: &T,
) -> Result<impl Stream<Item = reqwest::Result<Bytes>>, StreamError>
where
    T: Serialize + ?Sized,
{
    let response = client
        .post(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        return Err(StreamError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(response.bytes_stream())
}

impl<C: StreamCallbacks> Connection<C> {
    // == Execute ==
    /// Opens the stream at `url` and drives it with this connection.
    ///
    /// A request that fails before any body arrives is reported through
    /// `on_error` and ends the connection.
    pub async fn execute<T>(&mut self, client: &Client, url: &str, body: &T) -> StreamOutcome
    where
        T: Serialize + ?Sized,
    {
        let handle = self.handle().clone();
        info!(connection = %handle.name(), url, "Opening stream");

        let opened = tokio::select! {
            biased;
            _ = handle.cancelled() => return StreamOutcome::Cancelled,
            opened = open_stream(client, url, body) => opened,
        };

        match opened {
            Ok(stream) => self.run(stream).await,
            Err(e) => {
                let outcome = self.fail(e);
                handle.cancel();
                outcome
            }
        }
    }
}
