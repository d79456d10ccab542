//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `Classifier` - Intent/entity extraction service
//! - `Transport` - Chat network (outbound sends, inbound stream)
//! - `GeoLookup` - Nearby-settlement lookup for placeholders
//! - `AssetStore` - Media file existence checks
//! - `SessionStore` - Session snapshot persistence

mod asset_store;
mod classifier;
mod geo_lookup;
mod session_store;
mod transport;

pub use asset_store::AssetStore;
pub use classifier::{ClassificationContext, ClassificationRequest, Classifier, ClassifierError};
pub use geo_lookup::{GeoLookup, NoGeoData};
pub use session_store::{SessionStore, SessionStoreError};
pub use transport::{InboundMessage, InboundStream, Transport, TransportError};
