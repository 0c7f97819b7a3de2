pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{EventType, MapChange, MapEvent, RegionPayload};
pub use handler::{EventCallback, EventManager};
