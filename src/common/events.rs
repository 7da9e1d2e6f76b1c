use super::types::{ChatMessage, ConnectionState, RoomRef, TimelineEntry};

/// A change to the ordered timeline the UI renders.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineUpdate {
    Cleared,
    /// Added at the logical end; the view should scroll to it.
    Appended(TimelineEntry),
    /// A history block, oldest first, to insert before everything shown.
    Prepended(Vec<TimelineEntry>),
}

/// Events the dispatch loop sends up to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Timeline(TimelineUpdate),
    Alert(String),
    ConnectionChanged(ConnectionState),
    RoomChanged(Option<RoomRef>),
    RoomCreated(RoomRef),
    UploadCompleted { filename: String },
}

/// Signals pushed by a live connection onto the transport channel.
///
/// Every variant carries the id of the connection that produced it so
/// signals from a replaced connection can be told apart.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected { connection: u64 },
    Disconnected { connection: u64 },
    Notification { connection: u64, msg: String },
    MessageReceived { connection: u64, message: ChatMessage },
}
