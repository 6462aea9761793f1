pub mod domain;
pub mod ports;
pub mod reader;
pub mod sequence;
pub mod session;
pub mod story;

pub use domain::{Project, SavedPage, StoryImage, StoryPage, StoryResponse, User};
pub use ports::{BookRenderer, PersistenceService, PortError, PortResult, StorySynthesisService};
pub use reader::Reader;
pub use sequence::Sequence;
pub use session::{Screen, Session};
pub use story::{reconcile_segments, MISSING_SEGMENT_TEXT};
