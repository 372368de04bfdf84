use ssh_key::PrivateKey;

/// The role a [`crate::kex::KexMachine`] plays in the handshake.
///
/// Immutable for the lifetime of the state machine: a session never
/// switches sides mid-handshake.
#[derive(Debug, Clone)]
pub enum Role {
    /// We're the connecting side.
    Client,

    /// We're the listening side, holding the host key used to sign the exchange hash.
    Server(std::sync::Arc<PrivateKey>),
}

impl Role {
    /// Whether this role is [`Role::Client`].
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client)
    }

    /// The host private key, if we're playing [`Role::Server`].
    pub fn host_key(&self) -> Option<&PrivateKey> {
        match self {
            Self::Client => None,
            Self::Server(key) => Some(key),
        }
    }
}
