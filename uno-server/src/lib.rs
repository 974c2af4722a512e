//! # Uno server
//!
//! Hosts Uno games over TCP. The [`server::Server`] lobby gathers a fixed number of connections
//! per game and hands them to a [`session::Session`], which owns one `uno_engine` game and speaks
//! the byte protocol in [`protocol`] with every seated player.
//!
//! All state changes of a session happen on one task. Requests from different connections are
//! applied one at a time, and every notice a request causes is queued before the next request
//! from the same connection is read.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
