//! miku answers music links posted in chat with the same song on the other
//! streaming services it knows about.

pub mod composer;
pub mod config;
pub mod handler;
pub mod links;
pub mod registry;
pub mod resolver;
pub mod server;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
