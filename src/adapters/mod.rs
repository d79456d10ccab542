//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `classifier` - HTTP analysis service client and a mock
//! - `geo` - Static region → settlements table
//! - `media` - Filesystem and in-memory asset stores
//! - `storage` - File and in-memory session stores
//! - `transport` - Console and recording chat transports

pub mod classifier;
pub mod geo;
pub mod media;
pub mod storage;
pub mod transport;

pub use classifier::{HttpClassifier, HttpClassifierConfig, MockClassifier};
pub use geo::StaticGeoLookup;
pub use media::{FsAssetStore, InMemoryAssetStore};
pub use storage::{FileSessionStore, InMemorySessionStore};
pub use transport::{inbound_channel, ConsoleTransport, RecordingTransport};
