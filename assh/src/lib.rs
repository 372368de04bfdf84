#![doc = concat!(
    "[![crates.io](https://img.shields.io/crates/v/", env!("CARGO_PKG_NAME"), ")](https://crates.io/crates/", env!("CARGO_PKG_NAME"), ")",
    " ",
    "[![docs.rs](https://img.shields.io/docsrs/", env!("CARGO_PKG_NAME"), ")](https://docs.rs/", env!("CARGO_PKG_NAME"), ")",
    " ",
    "![license](https://img.shields.io/crates/l/", env!("CARGO_PKG_NAME"), ")"
)]
#![doc = ""]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! ### Supported algorithms
//!
//! #### Key-exchange:
//! see [`algorithm::KEX`].
//!
//! #### Host key:
//! see [`algorithm::HOST_KEY`].
//!
//! #### Encryption:
//! see [`algorithm::CIPHER`].
//!
//! #### MACs:
//! see [`algorithm::HMAC`].
//!
//! #### Compression:
//! see [`algorithm::COMPRESS`].
//!
//! ### Shape of a handshake
//!
//! Construct one [`KexMachine`] per connection with [`KexMachine::new`],
//! drive it through [`start_key_exchange`](KexMachine::start_key_exchange),
//! [`handle_kex_init`](KexMachine::handle_kex_init) and the ECDH/`NEWKEYS`
//! methods as messages cross the wire, and install the resulting
//! [`Protector`] on the connection's read and write halves once each
//! `NEWKEYS` fires. See the `kex` module for the full state machine.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    clippy::unwrap_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,
    clippy::undocumented_unsafe_blocks
)]
#![forbid(unsafe_code)]

mod error;
pub use error::{Error, Result};

mod exchange;
mod keys;

mod protector;
pub use protector::{CryptoFailure, TransportProtector};

pub mod algorithm;
pub mod kex;
pub mod message;
pub mod role;

pub use kex::{KexInitResponse, KexMachine, Protector};
pub use role::Role;
