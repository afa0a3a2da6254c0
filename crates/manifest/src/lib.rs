pub mod adaptation;
pub mod clock;
pub mod error;
pub mod event;
pub mod index;
pub mod manifest;
pub mod parsed;
pub mod period;
pub mod representation;
pub mod update;

pub use adaptation::{
    Adaptation, AdaptationType, RepresentationFilter, RepresentationFilterContext,
};
pub use error::{ManifestError, ManifestResult, MediaError, MediaErrorCode};
pub use event::{DecipherabilityUpdate, ManifestEvent};
pub use index::{RepresentationIndex, Segment, SegmentTiming};
pub use manifest::{ExpirationSignal, Manifest, ManifestOptions};
pub use parsed::{ParsedManifest, SupplementaryImageTrack, SupplementaryTextTrack};
pub use period::{Adaptations, Period, SharedPeriod};
pub use representation::{CodecSupportCheck, Decipherability, Representation};
