//! Collection of error handling types and aliases.

use thiserror::Error;

/// The error types that can occur while driving the user-authentication state machine.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// The peer sent a message that made no sense in the current authentication state.
    #[error("Peer sent a message that made no sense in the current state of user authentication")]
    UnexpectedMessage,
}

/// A handy [`std::result::Result`] type alias bounding the [`enum@Error`] struct as `E`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
