//! The `SSH-USERAUTH` messages this state machine emits and consumes.
//!
//! As with the key-exchange crate, these are already-decoded Rust values;
//! turning them into and out of the SSH binary packet protocol is the wire
//! codec's job.

use crate::availability::AvailableMethods;

/// A credential presented by a `USERAUTH_REQUEST`.
///
/// Only `None` (used to probe available methods) and `Password` are
/// reachable: public-key and host-based authentication are reserved slots
/// in the data model but this crate exercises password authentication only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No credential, used to ask the server which methods it accepts.
    None,

    /// A cleartext password credential.
    Password(String),
}

/// The `SSH_MSG_USERAUTH_REQUEST` (50) message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuthRequest {
    /// The username being authenticated.
    pub username: String,

    /// The name of the service requested once authenticated (e.g. `ssh-connection`).
    pub service_name: String,

    /// The credential offered.
    pub method: AuthMethod,
}

/// The `SSH_MSG_USERAUTH_FAILURE` (51) message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuthFailure {
    /// The methods the server is still willing to accept.
    pub authentications: AvailableMethods,

    /// Whether the just-rejected method nonetheless counted towards a
    /// multi-factor chain (RFC 4252 §5.1 partial success).
    pub partial_success: bool,
}

/// The `SSH_MSG_USERAUTH_SUCCESS` (52) message, with no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAuthSuccess;

/// A server delegate's adjudication of one [`UserAuthRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Authentication succeeded outright.
    Success,

    /// This method succeeded but further authentication is required.
    PartialSuccess(AvailableMethods),

    /// This method failed.
    Failure,
}

/// The wire message produced by translating an [`Outcome`] against a
/// server's advertised [`AvailableMethods`] (see [`crate::server::translate_outcome`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Send [`UserAuthSuccess`].
    Success,

    /// Send [`UserAuthFailure`].
    Failure(UserAuthFailure),
}
