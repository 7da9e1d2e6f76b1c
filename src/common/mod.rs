pub mod commands;
pub mod events;
pub mod types;

pub use commands::ClientCommand;
pub use events::{ClientEvent, TimelineUpdate, TransportEvent};
pub use types::{
    ChatMessage, ConnectionState, ContentType, Identity, Origin, RoomRef, TimelineEntry,
};
