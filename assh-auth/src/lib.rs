#![doc = concat!(
    "[![docs.rs](https://img.shields.io/docsrs/", env!("CARGO_PKG_NAME"), ")](https://docs.rs/", env!("CARGO_PKG_NAME"), ")",
    " ",
    "[![crates.io](https://img.shields.io/crates/l/", env!("CARGO_PKG_NAME"), ")](https://crates.io/crates/", env!("CARGO_PKG_NAME"), ")"
)]
#![doc = ""]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! This crate only drives the [`SSH-USERAUTH`](https://www.rfc-editor.org/rfc/rfc4252)
//! state machine: [`client::ClientAuthMachine`] on one side, [`server::ServerAuthMachine`]
//! on the other. Credentials are supplied, and requests adjudicated, by an
//! application-provided [`delegate::ClientDelegate`]/[`delegate::ServerDelegate`];
//! reading and writing the actual `SSH_MSG_USERAUTH_*` packets is left to the caller.
#![warn(missing_docs, clippy::unwrap_used, clippy::panic, clippy::unimplemented, clippy::todo)]
#![forbid(unsafe_code)]

/// The name of the `ssh-userauth` service, as negotiated over `SSH_MSG_SERVICE_REQUEST`.
pub const SERVICE_NAME: &str = "ssh-userauth";

/// The name of the `ssh-connection` service, requested once authenticated.
pub const CONNECTION_SERVICE_NAME: &str = "ssh-connection";

mod availability;
mod error;
pub mod message;

pub mod delegate;

pub mod client;
pub mod server;

pub use availability::AvailableMethods;
pub use error::{Error, Result};
