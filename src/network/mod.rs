pub mod api;
pub mod client;
pub mod codec;
pub mod transport;

pub use api::{ChatApi, HttpApi};
pub use client::{ChatClient, ClientOptions};
pub use transport::{WsConnector, socket_endpoint};
