mod collections;
pub mod config;
pub mod error;
pub mod event;
pub mod inventory;
pub mod network;
pub mod profile;
pub mod server;
pub mod types;
pub mod world;

pub use config::Config;
pub use network::Network;
pub use server::ServerContext;

mod prelude {
    pub(crate) use crate::collections::*;
    pub(crate) use crate::error::*;
    pub(crate) use crate::types::*;
    pub(crate) use std::{io, time};
    pub(crate) use std::net::TcpStream;
    pub(crate) use uuid::Uuid;
}
