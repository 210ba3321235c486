pub mod capability;
pub mod entry;
pub mod timeline;
pub mod track;

pub use capability::{Capability, CapabilitySet, TRACK_DEFINITIONS, TrackDefinition, TrackKind};
pub use entry::{Content, Entry, EntryId, EntryPatch, Origin, Provenance};
pub use timeline::{RangeAnchor, Timeline};
pub use track::Track;
