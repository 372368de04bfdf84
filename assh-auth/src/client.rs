//! The client side of the user-authentication state machine.

use crate::{
    availability::AvailableMethods,
    delegate::ClientDelegate,
    message::{AuthMethod, UserAuthFailure, UserAuthRequest},
    Error, Result,
};

#[derive(Debug)]
enum State {
    Idle,
    AwaitingNextRequest,
    AwaitingResponse,
    Authenticated,
    Failed,
}

/// Drives the client side of `SSH-USERAUTH`: consults a [`ClientDelegate`]
/// for credentials, tracks what's in flight, and classifies the server's responses.
#[derive(Debug)]
pub struct ClientAuthMachine {
    state: State,
}

impl Default for ClientAuthMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientAuthMachine {
    /// Start a fresh client-side authentication.
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Whether authentication succeeded.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, State::Authenticated)
    }

    /// Whether authentication has terminally failed (the delegate gave up).
    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed)
    }

    /// Consult the delegate for the first request to send.
    ///
    /// Legal only from [`State::Idle`]; calling it again is caller misuse.
    pub async fn begin_authentication(
        &mut self,
        delegate: &(dyn ClientDelegate),
        available: AvailableMethods,
    ) -> Option<UserAuthRequest> {
        assert!(matches!(self.state, State::Idle), "begin_authentication called outside Idle");
        self.state = State::AwaitingNextRequest;

        tracing::debug!("consulting client delegate for the first authentication attempt");
        delegate.next_authentication(available).await
    }

    /// Record that `req` was sent on the wire.
    ///
    /// Legal only from [`State::AwaitingNextRequest`].
    pub fn send_user_auth_request(&mut self, req: &UserAuthRequest) {
        assert!(
            matches!(self.state, State::AwaitingNextRequest),
            "send_user_auth_request called outside AwaitingNextRequest"
        );

        tracing::trace!(username = %req.username, "sent USERAUTH_REQUEST");
        self.state = State::AwaitingResponse;
    }

    /// Handle an inbound `USERAUTH_SUCCESS`.
    ///
    /// Legal from [`State::AwaitingResponse`] (-> [`State::Authenticated`]) or
    /// [`State::Authenticated`] itself (silently ignored, allowing slop after
    /// success). Anywhere else is a protocol violation.
    pub fn receive_user_auth_success(&mut self) -> Result<()> {
        match self.state {
            State::AwaitingResponse => {
                tracing::debug!("authenticated");
                self.state = State::Authenticated;
                Ok(())
            }
            State::Authenticated => Ok(()),
            _ => Err(Error::UnexpectedMessage),
        }
    }

    /// Handle an inbound `USERAUTH_FAILURE`: translate its advertised
    /// methods, consult the delegate again, and return its next request (if any).
    ///
    /// Legal only from [`State::AwaitingResponse`]; in [`State::Authenticated`]
    /// it's silently ignored (`Ok(None)`). Anywhere else is a protocol violation.
    pub async fn receive_user_auth_failure(
        &mut self,
        msg: &UserAuthFailure,
        delegate: &(dyn ClientDelegate),
    ) -> Result<Option<UserAuthRequest>> {
        match self.state {
            State::AwaitingResponse => {
                self.state = State::AwaitingNextRequest;

                tracing::debug!(partial_success = msg.partial_success, "authentication attempt rejected");
                Ok(delegate.next_authentication(msg.authentications).await)
            }
            State::Authenticated => Ok(None),
            _ => Err(Error::UnexpectedMessage),
        }
    }

    /// Handle an inbound `USERAUTH_REQUEST`.
    ///
    /// A client never receives this message; it's always a protocol violation.
    pub fn receive_user_auth_request(&mut self, _request: &UserAuthRequest) -> Result<()> {
        Err(Error::UnexpectedMessage)
    }

    /// Record that the delegate yielded no further method: authentication
    /// has terminally failed.
    pub fn no_further_methods(&mut self) {
        assert!(
            matches!(self.state, State::AwaitingNextRequest),
            "no_further_methods called outside AwaitingNextRequest"
        );

        tracing::debug!("client delegate exhausted, authentication failed");
        self.state = State::Failed;
    }
}

/// Turn a credential into a full request, filling in username/service.
pub fn request(username: impl Into<String>, service_name: impl Into<String>, method: AuthMethod) -> UserAuthRequest {
    UserAuthRequest {
        username: username.into(),
        service_name: service_name.into(),
        method,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct SamePassword(&'static str);

    #[async_trait]
    impl ClientDelegate for SamePassword {
        async fn next_authentication(&self, _available: AvailableMethods) -> Option<UserAuthRequest> {
            Some(request("foo", "ssh-connection", AuthMethod::Password(self.0.to_string())))
        }
    }

    struct GiveUpAfter(Mutex<u32>);

    #[async_trait]
    impl ClientDelegate for GiveUpAfter {
        async fn next_authentication(&self, _available: AvailableMethods) -> Option<UserAuthRequest> {
            let mut remaining = self.0.lock().unwrap();
            if *remaining == 0 {
                return None;
            }

            *remaining -= 1;
            Some(request("foo", "ssh-connection", AuthMethod::Password("bar".to_string())))
        }
    }

    #[async_std::test]
    async fn happy_client_auth() {
        let mut machine = ClientAuthMachine::new();
        let delegate = SamePassword("bar");

        let req = machine
            .begin_authentication(&delegate, AvailableMethods::all())
            .await
            .unwrap();
        assert_eq!(req.method, AuthMethod::Password("bar".to_string()));

        machine.send_user_auth_request(&req);
        machine.receive_user_auth_success().unwrap();

        assert!(machine.is_authenticated());
    }

    #[async_std::test]
    async fn sad_then_happy() {
        let mut machine = ClientAuthMachine::new();
        let delegate = SamePassword("bar");

        let req = machine
            .begin_authentication(&delegate, AvailableMethods::all())
            .await
            .unwrap();
        machine.send_user_auth_request(&req);

        let failure = UserAuthFailure {
            authentications: AvailableMethods::PASSWORD,
            partial_success: false,
        };
        let retry = machine.receive_user_auth_failure(&failure, &delegate).await.unwrap().unwrap();

        machine.send_user_auth_request(&retry);
        machine.receive_user_auth_success().unwrap();

        assert!(machine.is_authenticated());
    }

    #[async_std::test]
    async fn terminal_failure_then_protocol_violation() {
        let mut machine = ClientAuthMachine::new();
        let delegate = GiveUpAfter(Mutex::new(0));

        let req = machine
            .begin_authentication(&delegate, AvailableMethods::all())
            .await
            .unwrap();
        machine.send_user_auth_request(&req);

        let failure = UserAuthFailure {
            authentications: AvailableMethods::PASSWORD,
            partial_success: false,
        };
        let next = machine.receive_user_auth_failure(&failure, &delegate).await.unwrap();
        assert!(next.is_none());

        machine.no_further_methods();
        assert!(machine.is_failed());

        assert!(matches!(machine.receive_user_auth_success(), Err(Error::UnexpectedMessage)));
    }

    #[async_std::test]
    async fn inbound_request_is_always_a_protocol_violation() {
        let mut machine = ClientAuthMachine::new();
        let delegate = SamePassword("bar");

        let req = machine
            .begin_authentication(&delegate, AvailableMethods::all())
            .await
            .unwrap();
        machine.send_user_auth_request(&req);

        assert!(matches!(
            machine.receive_user_auth_request(&req),
            Err(Error::UnexpectedMessage)
        ));
    }

    #[async_std::test]
    async fn ignored_slop_after_success() {
        let mut machine = ClientAuthMachine::new();
        let delegate = SamePassword("bar");

        let req = machine
            .begin_authentication(&delegate, AvailableMethods::all())
            .await
            .unwrap();
        machine.send_user_auth_request(&req);
        machine.receive_user_auth_success().unwrap();

        machine.receive_user_auth_success().unwrap();
        let failure = UserAuthFailure {
            authentications: AvailableMethods::PASSWORD,
            partial_success: false,
        };
        assert!(machine.receive_user_auth_failure(&failure, &delegate).await.unwrap().is_none());

        assert!(machine.is_authenticated());
    }
}
