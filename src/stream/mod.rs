//! Stream Module
//!
//! Named, cancellable streaming connections and the SSE-style frame handling
//! used to consume them.

mod consumer;
mod fetch;
mod frame;
mod manager;
mod state;

pub use consumer::{Connection, StreamCallbacks, StreamOutcome};
pub use fetch::open_stream;
pub use frame::{FrameDecoder, StreamEvent, StreamMessage, DEFAULT_KIND};
pub use manager::{ConnectionHandle, ConnectionInfo, StreamConnectionManager};
pub use state::ConnectionState;
