//! Client-side state for one room: membership, history cursor, the merged
//! timeline and the upload selection. None of it performs I/O; the dispatch
//! loop in `network::client` turns the returned payloads and requests into
//! wire traffic.

pub mod paginator;
pub mod room;
pub mod timeline;
pub mod upload;

pub use paginator::{HistoryPaginator, PageOutcome, PageRequest};
pub use room::{ActiveRoom, RoomSession};
pub use timeline::{EchoPolicy, Timeline};
pub use upload::{UploadRelay, UploadRequest};
