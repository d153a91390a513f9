//! Stream Consumer
//!
//! Drives a registered connection: reads byte chunks, decodes frames and
//! invokes the caller's callbacks until the stream ends, fails or is cancelled.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::stream::{ConnectionHandle, FrameDecoder, StreamEvent, StreamMessage};

/// Receivers for the events of one stream.
///
/// Callbacks run on whichever task drives the connection, one chunk at a time.
pub trait StreamCallbacks {
    fn on_message(&mut self, message: StreamMessage);
    fn on_end(&mut self);
    fn on_error(&mut self, error: StreamError);
}

/// How a driven stream finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// `on_end` was invoked.
    Completed,
    /// `on_error` was invoked.
    Failed,
    /// The connection was cancelled; no callback was invoked for it.
    Cancelled,
}

// == Connection ==
/// A registered connection together with the callbacks it feeds.
#[derive(Debug)]
pub struct Connection<C> {
    handle: ConnectionHandle,
    callbacks: C,
    decoder: FrameDecoder,
}

impl<C> Connection<C> {
    pub(crate) fn new(handle: ConnectionHandle, callbacks: C) -> Self {
        Self {
            handle,
            callbacks,
            decoder: FrameDecoder::new(),
        }
    }

    /// Ends the stream after delivering a message of one of these kinds.
    pub fn with_terminal_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decoder = FrameDecoder::with_terminal_kinds(kinds);
        self
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn into_parts(self) -> (ConnectionHandle, C) {
        (self.handle, self.callbacks)
    }
}

impl<C: StreamCallbacks> Connection<C> {
    // == Run ==
    /// Reads `body` to completion.
    ///
    /// The connection is marked connected on entry. Cancellation is checked
    /// before every chunk and between delivered messages. When the loop exits
    /// the connection's own token is cancelled, so the registry reports it as
    /// disconnected.
    pub async fn run<S, B, E>(&mut self, body: S) -> StreamOutcome
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let handle = self.handle.clone();
        if handle.is_cancelled() {
            return StreamOutcome::Cancelled;
        }
        handle.mark_connected();

        tokio::pin!(body);
        let outcome = loop {
            let chunk = tokio::select! {
                biased;
                _ = handle.cancelled() => break StreamOutcome::Cancelled,
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    let events = self.decoder.push(bytes.as_ref());
                    if let Some(outcome) = self.dispatch(events) {
                        break outcome;
                    }
                }
                Some(Err(e)) => break self.fail(StreamError::Transport(e.to_string())),
                None => {
                    let events = self.decoder.finish();
                    if let Some(outcome) = self.dispatch(events) {
                        break outcome;
                    }
                    self.callbacks.on_end();
                    break StreamOutcome::Completed;
                }
            }
        };

        debug!(connection = %handle.name(), ?outcome, "Stream finished");
        handle.cancel();
        outcome
    }

    fn dispatch(&mut self, events: Vec<StreamEvent>) -> Option<StreamOutcome> {
        for event in events {
            match event {
                StreamEvent::Message(message) => {
                    if self.handle.is_cancelled() {
                        return Some(StreamOutcome::Cancelled);
                    }
                    self.callbacks.on_message(message);
                }
                StreamEvent::End => {
                    self.callbacks.on_end();
                    return Some(StreamOutcome::Completed);
                }
                StreamEvent::Error(detail) => {
                    return Some(self.fail(StreamError::Backend(detail)));
                }
            }
        }
        None
    }

    /// Marks the connection errored and reports `error`.
    ///
    /// Callers cancel the handle right after, so `ConnectionState::Error` is
    /// visible to registry queries made from inside `on_error` only. Once the
    /// callback returns, the next registry access reaps the slot and the name
    /// reads as disconnected.
    pub(crate) fn fail(&mut self, error: StreamError) -> StreamOutcome {
        warn!(connection = %self.handle.name(), error = %error, "Stream failed");
        self.handle.mark_error();
        self.callbacks.on_error(error);
        StreamOutcome::Failed
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ConnectionState, StreamConnectionManager};
    use bytes::Bytes;
    use futures::stream;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Recorder {
        messages: Vec<StreamMessage>,
        ended: usize,
        errors: Vec<String>,
    }

    impl StreamCallbacks for Recorder {
        fn on_message(&mut self, message: StreamMessage) {
            self.messages.push(message);
        }

        fn on_end(&mut self) {
            self.ended += 1;
        }

        fn on_error(&mut self, error: StreamError) {
            self.errors.push(error.to_string());
        }
    }

    fn chunks(parts: &[&'static str]) -> Vec<Result<Bytes, String>> {
        parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect()
    }

    #[tokio::test]
    async fn test_run_delivers_messages_and_end() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());

        let body = stream::iter(chunks(&[
            "data: {\"type\":\"data\",\"content\":\"Hel\"}\n\n",
            "data: {\"type\":\"data\",\"content\":\"lo\"}\n\ndata: {\"type\":\"end\"}\n\n",
            "data: {\"type\":\"data\",\"content\":\"ignored\"}\n\n",
        ]));

        let outcome = conn.run(body).await;

        assert_eq!(outcome, StreamOutcome::Completed);
        let recorder = conn.callbacks();
        assert_eq!(recorder.messages.len(), 2);
        assert_eq!(recorder.messages[1].payload, json!("lo"));
        assert_eq!(recorder.ended, 1);
        assert!(recorder.errors.is_empty());

        // Finishing cancels the handle, so the registry forgets the connection
        assert!(conn.handle().is_cancelled());
        assert_eq!(manager.connection_state("w1"), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_run_end_of_body_without_end_frame() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());

        let body = stream::iter(chunks(&["data: {\"type\":\"data\",\"content\":1}"]));
        let outcome = conn.run(body).await;

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(conn.callbacks().messages.len(), 1);
        assert_eq!(conn.callbacks().ended, 1);
    }

    #[tokio::test]
    async fn test_run_backend_error_frame() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());

        let body = stream::iter(chunks(&[
            "data: {\"type\":\"error\",\"detail\":\"workflow not found\"}\n\n",
        ]));
        let outcome = conn.run(body).await;

        assert_eq!(outcome, StreamOutcome::Failed);
        assert_eq!(conn.callbacks().errors, vec!["Stream error: workflow not found"]);
        assert_eq!(conn.callbacks().ended, 0);
        assert!(!manager.has_active_connections());
    }

    /// Records the registry's view of its own connection when an error arrives.
    #[derive(Debug)]
    struct StateOnError {
        manager: StreamConnectionManager,
        name: &'static str,
        seen: Option<ConnectionState>,
    }

    impl StreamCallbacks for StateOnError {
        fn on_message(&mut self, _message: StreamMessage) {}

        fn on_end(&mut self) {}

        fn on_error(&mut self, _error: StreamError) {
            self.seen = Some(self.manager.connection_state(self.name));
        }
    }

    #[tokio::test]
    async fn test_error_state_visible_only_inside_on_error() {
        let manager = StreamConnectionManager::new();
        let callbacks = StateOnError {
            manager: manager.clone(),
            name: "w1",
            seen: None,
        };
        let mut conn = manager.create_connection("w1", callbacks);

        let body = stream::iter(chunks(&["data: {\"type\":\"error\",\"detail\":\"boom\"}\n\n"]));
        let outcome = conn.run(body).await;

        assert_eq!(outcome, StreamOutcome::Failed);
        assert_eq!(conn.callbacks().seen, Some(ConnectionState::Error));
        assert_eq!(manager.connection_state("w1"), ConnectionState::Disconnected);
        assert!(manager.active_connections().is_empty());
    }

    #[tokio::test]
    async fn test_run_transport_error() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());

        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"data\",\"content\":\"a\"}\n\n")),
            Err("connection reset".to_string()),
        ]);
        let outcome = conn.run(body).await;

        assert_eq!(outcome, StreamOutcome::Failed);
        assert_eq!(conn.callbacks().messages.len(), 1);
        assert_eq!(conn.callbacks().errors, vec!["Stream read failed: connection reset"]);
    }

    #[tokio::test]
    async fn test_run_stops_when_superseded() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());

        // A body that never yields
        let body = stream::pending::<Result<Bytes, String>>();
        let replacer = manager.clone();
        let run = conn.run(body);
        let replace = async {
            tokio::task::yield_now().await;
            replacer.create_connection("w1", Recorder::default())
        };

        let (outcome, replacement) = tokio::join!(run, replace);

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert!(conn.callbacks().errors.is_empty());
        assert_eq!(conn.callbacks().ended, 0);
        // The replacement is untouched by the old loop's exit
        assert!(!replacement.handle().is_cancelled());
        assert_eq!(manager.active_connections(), vec!["w1".to_string()]);
    }

    #[test]
    fn test_run_on_cancelled_connection_returns_immediately() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());
        manager.close_connection("w1");

        let body = stream::iter(chunks(&["data: {\"type\":\"end\"}\n\n"]));
        let outcome = tokio_test::block_on(conn.run(body));

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(conn.callbacks().ended, 0);
    }

    #[tokio::test]
    async fn test_run_marks_connected_while_streaming() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager.create_connection("w1", Recorder::default());
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Bytes, String>>();

        let observer = manager.clone();
        let check = async move {
            tokio::task::yield_now().await;
            let connected = observer.is_connected("w1");
            drop(tx);
            connected
        };

        let (outcome, connected) = tokio::join!(conn.run(rx), check);

        assert!(connected);
        assert_eq!(outcome, StreamOutcome::Completed);
        assert!(!manager.is_connected("w1"));
    }

    #[tokio::test]
    async fn test_terminal_kind_completes_stream() {
        let manager = StreamConnectionManager::new();
        let mut conn = manager
            .create_connection("batch-7", Recorder::default())
            .with_terminal_kinds(["tester_complete"]);

        let body = stream::iter(chunks(&[
            "data: {\"type\":\"progress\",\"progress\":50}\n\n",
            "data: {\"type\":\"tester_complete\"}\n\n",
            "data: {\"type\":\"progress\",\"progress\":99}\n\n",
        ]));
        let outcome = conn.run(body).await;

        assert_eq!(outcome, StreamOutcome::Completed);
        let kinds: Vec<&str> = conn
            .callbacks()
            .messages
            .iter()
            .map(|m| m.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["progress", "tester_complete"]);
    }
}
