//! Transport adapters.
//!
//! - **ConsoleTransport** - stdin/stdout, used by the binary
//! - **RecordingTransport** - captures calls in memory (tests/embedding)
//!
//! `inbound_channel` builds an `InboundStream` fed through an mpsc sender,
//! for embedding the engine behind another network client.

mod console_transport;
mod recording_transport;

pub use console_transport::ConsoleTransport;
pub use recording_transport::{RecordingTransport, SentItem, SentRecord};

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use crate::ports::{InboundMessage, InboundStream};

/// Creates a sender and the inbound stream it feeds.
///
/// The stream ends once every sender is dropped.
pub fn inbound_channel(buffer: usize) -> (mpsc::Sender<InboundMessage>, InboundStream) {
    let (tx, rx) = mpsc::channel(buffer);
    let stream = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|message| (message, rx))
    })
    .boxed();
    (tx, stream)
}
