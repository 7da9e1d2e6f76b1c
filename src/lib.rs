//! Client side of a room-based chat service: Socket.IO transport, room
//! membership, paginated history merged with live delivery, and media uploads.

pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod sync;
pub mod ui;
