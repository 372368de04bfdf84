//! The Curve25519 key exchanger: computes the ephemeral ECDH shared secret,
//! formats the exchange hash, and derives the per-direction keys.
//!
//! This is the one piece of cryptographic orchestration [`crate::KexMachine`]
//! delegates to; the primitives themselves (scalar multiplication, signing,
//! hashing) come from `x25519-dalek`, `ssh-key` and `sha2`.

use signature::{Signer, Verifier};
use ssh_key::{PrivateKey, PublicKey, Signature};

use crate::{exchange::ExchangeHash, keys::SessionKeys, message, Error, Result};

/// A key-exchange in progress: the exchange-hash accumulator, seeded with
/// both version strings and both `KEXINIT` payloads, waiting on the ECDH step.
#[derive(Debug, Clone)]
pub struct Exchanger {
    hash: ExchangeHash,

    /// The negotiated key-exchange algorithm, for diagnostics only --
    /// `curve25519-sha256` and `curve25519-sha256@libssh.org` are identical
    /// beyond the name.
    pub(crate) algorithm: String,
}

/// The outcome of a completed ECDH exchange: the shared secret's session
/// identity and the keys derived from it.
pub struct KexResult {
    /// The exchange hash `H` of this exchange.
    pub exchange_hash: [u8; 32],

    /// The session identifier: the first exchange hash of the connection.
    pub session_id: [u8; 32],

    /// The six (four, for AES-GCM which needs no separate integrity key times
    /// two directions) directional keys derived from the shared secret.
    pub keys: SessionKeys,
}

impl Exchanger {
    pub(crate) fn new(hash: ExchangeHash, algorithm: String) -> Self {
        Self { hash, algorithm }
    }

    /// As the client: generate an ephemeral keypair and produce the
    /// `KEX_ECDH_INIT` message to send, retaining the secret half for
    /// [`Self::complete_as_client`].
    pub(crate) fn begin_as_client(self) -> (PendingClientEcdh, message::EcdhInit) {
        let secret = x25519_dalek::EphemeralSecret::random_from_rng(rand::thread_rng());
        let public = x25519_dalek::PublicKey::from(&secret);

        let init = message::EcdhInit {
            q_c: public.to_bytes(),
        };

        (
            PendingClientEcdh {
                exchanger: self,
                secret,
                public,
            },
            init,
        )
    }

    /// As the server: given the client's ephemeral public key and the host
    /// key to sign with, complete the exchange and produce the `KEX_ECDH_REPLY`.
    pub(crate) fn complete_as_server(
        self,
        client_init: &message::EcdhInit,
        host_key: &PrivateKey,
    ) -> Result<(KexResult, message::EcdhReply)> {
        let q_c = x25519_dalek::PublicKey::from(client_init.q_c);

        let secret = x25519_dalek::EphemeralSecret::random_from_rng(rand::thread_rng());
        let q_s = x25519_dalek::PublicKey::from(&secret);
        let shared = secret.diffie_hellman(&q_c);

        reject_degenerate_shared_secret(&shared)?;

        let host_public = host_key.public_key().to_bytes()?;

        let hash = self
            .hash
            .finish(&host_public, q_c.as_bytes(), q_s.as_bytes(), shared.as_bytes());

        let signature = Signer::sign(host_key, &hash);

        let reply = message::EcdhReply {
            server_host_key: host_public,
            server_ephemeral: *q_s.as_bytes(),
            signature: signature.to_vec(),
        };

        Ok((finish_result(&hash, shared.as_bytes()), reply))
    }
}

/// An in-flight client-side ECDH: the ephemeral secret generated in
/// [`Exchanger::begin_as_client`], retained until the server's reply arrives.
pub struct PendingClientEcdh {
    exchanger: Exchanger,
    secret: x25519_dalek::EphemeralSecret,
    public: x25519_dalek::PublicKey,
}

impl PendingClientEcdh {
    /// As the client: verify the server's signature over the reconstructed
    /// exchange hash, and derive the session keys.
    pub(crate) fn complete_as_client(self, reply: &message::EcdhReply) -> Result<KexResult> {
        let q_s = x25519_dalek::PublicKey::from(reply.server_ephemeral);
        let shared = self.secret.diffie_hellman(&q_s);

        reject_degenerate_shared_secret(&shared)?;

        let host_key = PublicKey::from_bytes(&reply.server_host_key)?;

        let hash = self.exchanger.hash.finish(
            &reply.server_host_key,
            self.public.as_bytes(),
            q_s.as_bytes(),
            shared.as_bytes(),
        );

        let signature = Signature::try_from(reply.signature.as_slice())?;
        Verifier::verify(&host_key, &hash, &signature)?;

        Ok(finish_result(&hash, shared.as_bytes()))
    }
}

/// Reject a shared secret of all zero bytes, produced when the peer's
/// ephemeral public key is a low-order Curve25519 point: `x25519-dalek`
/// performs the scalar multiplication regardless, so this is caught
/// explicitly rather than silently deriving predictable session keys.
fn reject_degenerate_shared_secret(shared: &x25519_dalek::SharedSecret) -> Result<()> {
    if shared.as_bytes() == &[0u8; 32] {
        return Err(Error::MalformedEphemeralKey);
    }

    Ok(())
}

fn finish_result(hash: &[u8; 32], shared_secret: &[u8]) -> KexResult {
    let keys = SessionKeys::derive(shared_secret, hash, hash);

    KexResult {
        exchange_hash: *hash,
        session_id: *hash,
        keys,
    }
}

impl std::fmt::Debug for KexResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KexResult")
            .field("exchange_hash", &hex(&self.exchange_hash))
            .field("session_id", &hex(&self.session_id))
            .finish_non_exhaustive()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
