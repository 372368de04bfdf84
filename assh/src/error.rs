//! Collection of error handling types and aliases.

use thiserror::Error;

/// The error types that can occur while driving the key-exchange state machine.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// SSH key error, raised while parsing or using a host or ephemeral key.
    #[error(transparent)]
    Key(#[from] ssh_key::Error),

    /// Signature creation or verification failed during the key-exchange.
    #[error(transparent)]
    Signature(#[from] signature::Error),

    /// No common key-exchange algorithm found between both sides.
    #[error("Unable to negociate a common kex algorithm")]
    NoCommonKex,

    /// No common host-key algorithm found between both sides.
    #[error("Unable to negociate a common host-key algorithm")]
    NoCommonHostKey,

    /// No common cipher algorithm found between both sides.
    #[error("Unable to negociate a common encryption algorithm")]
    NoCommonCipher,

    /// No common hmac algorithm found between both sides.
    #[error("Unable to negociate a common HMAC algorithm")]
    NoCommonHmac,

    /// No common compression algorithm found between both sides.
    #[error("Unable to negociate a common compression algorithm")]
    NoCommonCompression,

    /// The ephemeral public key received from the peer was malformed.
    #[error("Malformed ephemeral public key received from peer")]
    MalformedEphemeralKey,

    /// The message received was unexpected in the current state of the key-exchange.
    #[error("Peer sent a message that made no sense in the current state of the key-exchange")]
    UnexpectedMessage,
}

/// A handy [`std::result::Result`] type alias bounding the [`enum@Error`] struct as `E`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
