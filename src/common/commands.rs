use std::path::PathBuf;

/// Commands the UI sends down to the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Ask the service to create a room; the result comes back as `RoomCreated`.
    CreateRoom { name: String },
    /// Join `room` (numeric id `room_id`) as `user`, leaving any current room first.
    JoinRoom {
        user: String,
        room: String,
        room_id: i64,
    },
    LeaveRoom,
    SendText(String),
    /// Fetch the next (older) page of history for the current room.
    LoadMoreHistory,
    /// Pick the file that the next `UploadSelected` will relay. `None` clears it.
    SelectFile(Option<PathBuf>),
    UploadSelected,
}
