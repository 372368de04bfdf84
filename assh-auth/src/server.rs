//! The server side of the user-authentication state machine.
//!
//! Calling `send_user_auth_success`/`send_user_auth_failure` before a
//! request is in flight is caller misuse, not a protocol error: those
//! paths `panic!`, deliberately.
#![allow(clippy::panic)]

use crate::{
    availability::AvailableMethods,
    delegate::ServerDelegate,
    message::{Outcome, Response, UserAuthFailure, UserAuthRequest, UserAuthSuccess},
    Error, Result,
};

#[derive(Debug)]
enum State {
    Idle,
    Authenticating { pending: usize },
    Authenticated,
}

/// Drives the server side of `SSH-USERAUTH`: hands each inbound request to a
/// [`ServerDelegate`] and translates its verdict into a wire [`Response`].
///
/// Requests may be adjudicated out of arrival order (the delegate resolves
/// its own futures); this machine only tracks how many are still in flight,
/// so it knows whether a late `Outcome::Success` should still be honored.
#[derive(Debug)]
pub struct ServerAuthMachine {
    state: State,
    available: AvailableMethods,
}

impl ServerAuthMachine {
    /// Start a fresh server-side authentication, advertising `available` methods.
    pub fn new(available: AvailableMethods) -> Self {
        Self {
            state: State::Idle,
            available,
        }
    }

    /// Whether some request has already succeeded.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, State::Authenticated)
    }

    /// Record an inbound `USERAUTH_REQUEST` and, unless already authenticated,
    /// return the delegate's future to adjudicate it.
    ///
    /// Returns `None` iff already [`State::Authenticated`], signalling the
    /// caller should ignore further requests on the wire without consulting
    /// the delegate again.
    pub fn receive_user_auth_request<'a>(
        &mut self,
        request: UserAuthRequest,
        delegate: &'a (dyn ServerDelegate),
    ) -> Option<impl std::future::Future<Output = Outcome> + 'a> {
        match self.state {
            State::Authenticated => None,
            State::Idle => {
                self.state = State::Authenticating { pending: 1 };
                Some(delegate.request_received(request))
            }
            State::Authenticating { pending } => {
                self.state = State::Authenticating { pending: pending + 1 };
                Some(delegate.request_received(request))
            }
        }
    }

    /// Record that a resolved [`Outcome`] was translated and sent as
    /// `USERAUTH_SUCCESS`, completing authentication.
    pub fn send_user_auth_success(&mut self) {
        match self.state {
            State::Authenticating { .. } => {
                tracing::debug!("authenticated");
                self.state = State::Authenticated;
            }
            State::Authenticated => {}
            State::Idle => panic!("send_user_auth_success called outside Authenticating"),
        }
    }

    /// Record that a resolved [`Outcome`] was translated and sent as
    /// `USERAUTH_FAILURE`, decrementing the in-flight count.
    pub fn send_user_auth_failure(&mut self) {
        match &mut self.state {
            State::Authenticating { pending } => {
                *pending -= 1;
                tracing::trace!(pending = *pending, "authentication attempt rejected");
            }
            State::Authenticated => {}
            State::Idle => panic!("send_user_auth_failure called outside Authenticating"),
        }
    }

    /// Translate a delegate's [`Outcome`] into the [`Response`] to send on
    /// the wire, given this machine's advertised methods.
    pub fn translate_outcome(&self, outcome: Outcome) -> Response {
        translate_outcome(outcome, self.available)
    }

    /// Handle an inbound `USERAUTH_SUCCESS`.
    ///
    /// A server never receives this message; it's always a protocol violation.
    pub fn receive_user_auth_success(&mut self, _msg: &UserAuthSuccess) -> Result<()> {
        Err(Error::UnexpectedMessage)
    }

    /// Handle an inbound `USERAUTH_FAILURE`.
    ///
    /// A server never receives this message; it's always a protocol violation.
    pub fn receive_user_auth_failure(&mut self, _msg: &UserAuthFailure) -> Result<()> {
        Err(Error::UnexpectedMessage)
    }
}

/// Translate an [`Outcome`] against a server's advertised `available`
/// methods into the [`Response`] to send on the wire.
pub fn translate_outcome(outcome: Outcome, available: AvailableMethods) -> Response {
    match outcome {
        Outcome::Success => Response::Success,
        Outcome::Failure => Response::Failure(UserAuthFailure {
            authentications: available,
            partial_success: false,
        }),
        Outcome::PartialSuccess(remaining) => Response::Failure(UserAuthFailure {
            authentications: remaining,
            partial_success: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::message::AuthMethod;

    struct AcceptUsername(&'static str);

    #[async_trait]
    impl ServerDelegate for AcceptUsername {
        async fn request_received(&self, request: UserAuthRequest) -> Outcome {
            if request.username == self.0 {
                Outcome::Success
            } else {
                Outcome::Failure
            }
        }
    }

    fn req(username: &str) -> UserAuthRequest {
        UserAuthRequest {
            username: username.to_string(),
            service_name: "ssh-connection".to_string(),
            method: AuthMethod::Password("x".to_string()),
        }
    }

    #[async_std::test]
    async fn parallel_denial_resolves_in_delegate_order_not_arrival_order() {
        let mut machine = ServerAuthMachine::new(AvailableMethods::PASSWORD);
        let delegate = AcceptUsername("winner");

        let mut futures = Vec::new();
        for i in 0..10 {
            let username = if i == 9 { "winner".to_string() } else { format!("guest{i}") };
            futures.push(machine.receive_user_auth_request(req(&username), &delegate).unwrap());
        }

        let mut outcomes = futures::future::join_all(futures).await;
        let last = outcomes.pop().unwrap();
        assert_eq!(last, Outcome::Success);

        for outcome in outcomes {
            assert_eq!(outcome, Outcome::Failure);
            machine.send_user_auth_failure();
        }

        let response = machine.translate_outcome(last);
        assert_eq!(response, Response::Success);
        machine.send_user_auth_success();

        assert!(machine.is_authenticated());
    }

    #[async_std::test]
    async fn accept_then_ignore() {
        let mut machine = ServerAuthMachine::new(AvailableMethods::PASSWORD);
        let delegate = AcceptUsername("winner");

        let outcome = machine.receive_user_auth_request(req("winner"), &delegate).unwrap().await;
        assert_eq!(machine.translate_outcome(outcome), Response::Success);
        machine.send_user_auth_success();

        assert!(machine.receive_user_auth_request(req("winner"), &delegate).is_none());
    }

    #[test]
    fn inbound_success_and_failure_are_always_protocol_violations() {
        let mut machine = ServerAuthMachine::new(AvailableMethods::PASSWORD);

        assert!(matches!(
            machine.receive_user_auth_success(&UserAuthSuccess),
            Err(Error::UnexpectedMessage)
        ));
        assert!(matches!(
            machine.receive_user_auth_failure(&UserAuthFailure {
                authentications: AvailableMethods::PASSWORD,
                partial_success: false,
            }),
            Err(Error::UnexpectedMessage)
        ));
    }
}
