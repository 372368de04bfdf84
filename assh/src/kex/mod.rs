//! Key-exchange: algorithm negotiation, Curve25519 ECDH, and the state
//! machine that drives both from a `KEXINIT` to a live [`crate::TransportProtector`].

mod exchanger;
mod machine;

pub use machine::{KexInitResponse, KexMachine, Protector};
