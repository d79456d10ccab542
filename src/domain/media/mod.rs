//! Media domain: asset catalogs, dispatch policy, sequences, and history.

mod catalog;
mod history;
mod media_type;
mod sequence;

pub use catalog::{
    AssetCatalog, AssetSets, FailedSendPolicy, MediaAsset, MediaConfig, MediaSettings,
    MissingMediaAction, MissingMediaPolicy, ResolvedAsset,
};
pub use history::{DispatchRecord, MediaHistory};
pub use media_type::{MediaRef, MediaType};
pub use sequence::{
    Engagement, MediaSequence, SequenceConditions, SequenceItem, SequenceItemKind,
    HIGH_ENGAGEMENT_FLAG,
};
