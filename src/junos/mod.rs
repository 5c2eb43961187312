//! Junos configuration database over NETCONF.
//!
//! [`rpc`] builds request bodies, [`reply`] interprets `<rpc-reply>`
//! documents, and [`database`] implements
//! [`ConfigDatabase`](crate::transaction::ConfigDatabase) for a live
//! [`Session`](crate::connection::Session).

pub mod database;
pub mod reply;
pub mod rpc;

pub use reply::{NetconfError, NetconfReply, Severity};
