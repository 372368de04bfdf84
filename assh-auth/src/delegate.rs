//! The narrow async interfaces by which the embedding application supplies
//! credentials (client) or adjudicates requests (server).
//!
//! Each is consulted from the caller's own executor; the state machines
//! never poll anything themselves, they only hold the resulting future.

use async_trait::async_trait;

use crate::{
    availability::AvailableMethods,
    message::{Outcome, UserAuthRequest},
};

/// Supplies credentials on the client side of authentication.
#[async_trait]
pub trait ClientDelegate: Send + Sync {
    /// Asked for the next request to send, given the methods the server
    /// last reported as acceptable (all methods, on the very first call).
    ///
    /// Returning `None` means "give up": the state machine treats this as
    /// terminal failure. This trait does not filter by `available` itself;
    /// the state machine trusts whatever the delegate returns.
    async fn next_authentication(&self, available: AvailableMethods) -> Option<UserAuthRequest>;
}

/// Adjudicates incoming requests on the server side of authentication.
#[async_trait]
pub trait ServerDelegate: Send + Sync {
    /// Asked to resolve one [`UserAuthRequest`] to an [`Outcome`].
    ///
    /// Requests are handed to this method in the order they arrived on the
    /// wire, but this method may resolve them in any order; the state
    /// machine surfaces responses to its caller in resolution order.
    async fn request_received(&self, request: UserAuthRequest) -> Outcome;
}
