//! The key-exchange state machine: the driver that ties algorithm
//! negotiation ([`crate::algorithm`]), the Curve25519 exchanger
//! ([`super::exchanger`]) and the transport protection factory
//! ([`crate::protector`]) into the sequence of messages a `SSH-TRANS`
//! connection actually sends and receives.
//!
//! Calling the `send_*`/`handle_*` methods out of the order their state
//! permits is caller misuse, not a protocol error (see the crate's error
//! handling design): those paths `panic!`, deliberately, rather than
//! returning a `Result` the caller could choose to ignore.
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use rand::RngCore;
use replace_with::replace_with_or_abort;

use super::exchanger::{Exchanger, KexResult, PendingClientEcdh};
use crate::{algorithm, exchange::ExchangeHash, message, protector::TransportProtector, role::Role, Error, Result};

/// The transport protector produced by a completed key-exchange, shared
/// between [`KexMachine::send_new_keys`] and [`KexMachine::handle_new_keys`]
/// so that both hand the I/O layer the very same instance.
pub type Protector = Arc<Mutex<TransportProtector>>;

/// What's retained of a completed exchange once its keys have been consumed
/// into a [`TransportProtector`]: just enough to identify the session.
#[derive(Debug, Clone, Copy)]
struct KexIdentity {
    #[allow(dead_code)]
    exchange_hash: [u8; 32],
    #[allow(dead_code)]
    session_id: [u8; 32],
}

impl From<&KexResult> for KexIdentity {
    fn from(result: &KexResult) -> Self {
        Self {
            exchange_hash: result.exchange_hash,
            session_id: result.session_id,
        }
    }
}

enum KexState {
    Idle,
    KexSent(message::KexInit),
    AwaitingKexInitWrongGuess(Exchanger),
    AwaitingKexInit(Exchanger),
    KexInitReceived(KexResult),
    KexInitSent(PendingClientEcdh),
    KeysExchanged(KexIdentity, Protector),
    NewKeysReceived(KexIdentity, Protector),
    NewKeysSent(KexIdentity, Protector),
    Complete,
}

impl std::fmt::Debug for KexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::KexSent(_) => "KexSent",
            Self::AwaitingKexInitWrongGuess(_) => "AwaitingKexInitWrongGuess",
            Self::AwaitingKexInit(_) => "AwaitingKexInit",
            Self::KexInitReceived(_) => "KexInitReceived",
            Self::KexInitSent(_) => "KexInitSent",
            Self::KeysExchanged(..) => "KeysExchanged",
            Self::NewKeysReceived(..) => "NewKeysReceived",
            Self::NewKeysSent(..) => "NewKeysSent",
            Self::Complete => "Complete",
        };

        f.write_str(name)
    }
}

/// What to send in reply to the peer's `KEXINIT`, in order.
///
/// In the common case -- our own `KEXINIT` already went out via
/// [`KexMachine::start_key_exchange`] -- only `ecdh_init` is ever populated
/// (and only for the client, which proceeds to ECDH immediately once
/// algorithms are negotiated). `kex_init` is populated only when the peer's
/// `KEXINIT` arrives before we've started our own side of the exchange: our
/// `KEXINIT` must still reach the peer, and must do so before any `ECDH_INIT`
/// that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct KexInitResponse {
    /// Our own `KEXINIT`, if we hadn't already sent it.
    pub kex_init: Option<message::KexInit>,

    /// The client's `KEX_ECDH_INIT`, if negotiation just completed and we're the client.
    pub ecdh_init: Option<message::EcdhInit>,
}

/// Drives one side of an SSH key-exchange, from algorithm negotiation
/// through to an installed [`TransportProtector`].
///
/// Owned exclusively by one connection's event loop; every method takes
/// `&mut self` and returns synchronously, per the crate's single-threaded
/// cooperative scheduling model.
pub struct KexMachine {
    role: Role,
    v_c: Vec<u8>,
    v_s: Vec<u8>,
    state: KexState,
}

impl KexMachine {
    /// Start a new key-exchange for the given role, seeded with both sides'
    /// protocol version-identification strings (`V_C`, `V_S`), always
    /// supplied client-first regardless of which side we play.
    pub fn new(role: Role, v_c: impl Into<Vec<u8>>, v_s: impl Into<Vec<u8>>) -> Self {
        Self {
            role,
            v_c: v_c.into(),
            v_s: v_s.into(),
            state: KexState::Idle,
        }
    }

    fn is_client(&self) -> bool {
        self.role.is_client()
    }

    fn role_name(&self) -> &'static str {
        if self.is_client() {
            "client"
        } else {
            "server"
        }
    }

    /// Whether the handshake has completed (both `NEWKEYS` have crossed).
    pub fn is_complete(&self) -> bool {
        matches!(self.state, KexState::Complete)
    }

    /// Begin the exchange proactively, producing our own `KEXINIT` to send.
    ///
    /// Legal only from [`KexState::Idle`]; calling it twice, or after the
    /// peer's `KEXINIT` has already been handled, is caller misuse.
    pub fn start_key_exchange(&mut self) -> message::KexInit {
        tracing::debug!(role = ?self.role_name(), "starting key exchange");

        let ours = build_our_kex_init();
        let to_send = ours.clone();

        replace_with_or_abort(&mut self.state, move |state| match state {
            KexState::Idle => KexState::KexSent(ours),
            other => panic!("start_key_exchange called outside Idle: {other:?}"),
        });

        to_send
    }

    /// Confirm that the `KEXINIT` produced by [`Self::start_key_exchange`]
    /// (or the `kex_init` half of a [`KexInitResponse`]) was actually sent.
    ///
    /// Bookkeeping only: the transition already happened when the message
    /// was produced. Panics if no `KEXINIT` has been produced yet.
    pub fn send_kex_init(&self, _sent: &message::KexInit) {
        debug_assert!(
            !matches!(self.state, KexState::Idle),
            "send_kex_init called before a KEXINIT was produced"
        );
    }

    /// Handle the peer's `KEXINIT`: negotiate algorithms and, if we're the
    /// client, begin ECDH immediately.
    ///
    /// Legal from [`KexState::Idle`] (we haven't started our own side yet --
    /// the simultaneous-open race) or [`KexState::KexSent`] (the common
    /// case). Anything else is a protocol violation.
    pub fn handle_kex_init(&mut self, peer: message::KexInit) -> Result<KexInitResponse> {
        tracing::trace!("received KEXINIT");

        let we_are_client = self.is_client();
        let v_c = self.v_c.clone();
        let v_s = self.v_s.clone();

        let mut outcome = Err(Error::UnexpectedMessage);

        replace_with_or_abort(&mut self.state, |state| match state {
            KexState::Idle => {
                let ours = build_our_kex_init();

                match negotiate(&v_c, &v_s, we_are_client, &ours, &peer) {
                    Ok((exchanger, wrong_guess)) => {
                        let (next, ecdh_init) = finalize_negotiation(we_are_client, exchanger, wrong_guess);
                        outcome = Ok(KexInitResponse {
                            kex_init: Some(ours),
                            ecdh_init,
                        });
                        next
                    }
                    Err(err) => {
                        outcome = Err(err);
                        KexState::Idle
                    }
                }
            }
            KexState::KexSent(ours) => match negotiate(&v_c, &v_s, we_are_client, &ours, &peer) {
                Ok((exchanger, wrong_guess)) => {
                    tracing::debug!(algorithm = %exchanger.algorithm, wrong_guess, "negotiated key-exchange algorithm");

                    let (next, ecdh_init) = finalize_negotiation(we_are_client, exchanger, wrong_guess);
                    outcome = Ok(KexInitResponse {
                        kex_init: None,
                        ecdh_init,
                    });
                    next
                }
                Err(err) => {
                    outcome = Err(err);
                    KexState::KexSent(ours)
                }
            },
            other => {
                outcome = Err(Error::UnexpectedMessage);
                other
            }
        });

        outcome
    }

    /// Confirm that the client's `KEX_ECDH_INIT` was sent. Bookkeeping only.
    pub fn send_ecdh_init(&self, _sent: &message::EcdhInit) {
        debug_assert!(
            matches!(self.state, KexState::KexInitSent(_)),
            "send_ecdh_init called outside KexInitSent"
        );
    }

    /// Handle the client's `KEX_ECDH_INIT`.
    ///
    /// From [`KexState::AwaitingKexInitWrongGuess`], the message matches a
    /// guess that disagreed with negotiation and is silently discarded
    /// (scenario: wrong-guess discard). From [`KexState::AwaitingKexInit`],
    /// completes the exchange as server and returns the `KEX_ECDH_REPLY` to send.
    pub fn handle_ecdh_init(&mut self, msg: &message::EcdhInit) -> Result<Option<message::EcdhReply>> {
        let host_key = match &self.role {
            Role::Server(key) => Some(Arc::clone(key)),
            Role::Client => None,
        };

        let mut outcome = Ok(None);

        replace_with_or_abort(&mut self.state, |state| match state {
            KexState::AwaitingKexInitWrongGuess(exchanger) => {
                tracing::debug!("discarding ECDH_INIT that followed a wrong first-packet-follows guess");
                outcome = Ok(None);
                KexState::AwaitingKexInit(exchanger)
            }
            KexState::AwaitingKexInit(exchanger) => {
                let Some(host_key) = host_key.as_deref() else {
                    outcome = Err(Error::UnexpectedMessage);
                    return KexState::Idle;
                };

                match exchanger.complete_as_server(msg, host_key) {
                    Ok((result, reply)) => {
                        tracing::debug!("completed ECDH as server");
                        outcome = Ok(Some(reply));
                        KexState::KexInitReceived(result)
                    }
                    Err(err) => {
                        // Fatal: the caller is expected to tear down the connection.
                        outcome = Err(err);
                        KexState::Idle
                    }
                }
            }
            other => {
                outcome = Err(Error::UnexpectedMessage);
                other
            }
        });

        outcome
    }

    /// Confirm that the server's `KEX_ECDH_REPLY` was sent: builds the
    /// [`TransportProtector`] from the completed exchange and moves to
    /// [`KexState::KeysExchanged`].
    ///
    /// Panics outside [`KexState::KexInitReceived`].
    pub fn send_ecdh_reply(&mut self, _sent: &message::EcdhReply) {
        replace_with_or_abort(&mut self.state, |state| match state {
            KexState::KexInitReceived(result) => {
                let identity = KexIdentity::from(&result);
                let protector = TransportProtector::new(result.keys, false);

                KexState::KeysExchanged(identity, Arc::new(Mutex::new(protector)))
            }
            other => panic!("send_ecdh_reply called outside KexInitReceived: {other:?}"),
        });
    }

    /// Handle the server's `KEX_ECDH_REPLY`: verify its signature, derive
    /// session keys, build the [`TransportProtector`], and return the
    /// `NEWKEYS` to send next (the client always proceeds immediately).
    pub fn handle_ecdh_reply(&mut self, reply: &message::EcdhReply) -> Result<message::NewKeys> {
        let mut outcome = Err(Error::UnexpectedMessage);

        replace_with_or_abort(&mut self.state, |state| match state {
            KexState::KexInitSent(pending) => match pending.complete_as_client(reply) {
                Ok(result) => {
                    tracing::debug!("completed ECDH as client, transport protector installed");

                    let identity = KexIdentity::from(&result);
                    let protector = TransportProtector::new(result.keys, true);

                    outcome = Ok(message::NewKeys);
                    KexState::KeysExchanged(identity, Arc::new(Mutex::new(protector)))
                }
                Err(err) => {
                    // Fatal: the caller is expected to tear down the connection.
                    outcome = Err(err);
                    KexState::Idle
                }
            },
            other => {
                outcome = Err(Error::UnexpectedMessage);
                other
            }
        });

        outcome
    }

    /// Record that we sent `NEWKEYS`, returning the protector the I/O layer
    /// should install for the direction we write.
    ///
    /// Legal from [`KexState::KeysExchanged`] (the peer hasn't sent theirs
    /// yet; moves to [`KexState::NewKeysSent`]) or [`KexState::NewKeysReceived`]
    /// (the peer's already crossed; moves to [`KexState::Complete`]).
    pub fn send_new_keys(&mut self) -> Protector {
        let mut outcome = None;

        replace_with_or_abort(&mut self.state, |state| match state {
            KexState::KeysExchanged(identity, protector) => {
                outcome = Some(Arc::clone(&protector));
                KexState::NewKeysSent(identity, protector)
            }
            KexState::NewKeysReceived(identity, protector) => {
                tracing::debug!("key exchange complete");
                outcome = Some(Arc::clone(&protector));
                KexState::Complete
            }
            other => panic!("send_new_keys called outside KeysExchanged/NewKeysReceived: {other:?}"),
        });

        outcome.expect("every transition arm above sets outcome")
    }

    /// Record that the peer's `NEWKEYS` arrived, returning the protector the
    /// I/O layer should install for the direction we read.
    ///
    /// Legal from [`KexState::KeysExchanged`] or [`KexState::NewKeysSent`];
    /// anything else is a protocol violation (an unsolicited `NEWKEYS`).
    pub fn handle_new_keys(&mut self) -> Result<Protector> {
        let mut outcome = Err(Error::UnexpectedMessage);

        replace_with_or_abort(&mut self.state, |state| match state {
            KexState::KeysExchanged(identity, protector) => {
                outcome = Ok(Arc::clone(&protector));
                KexState::NewKeysReceived(identity, protector)
            }
            KexState::NewKeysSent(identity, protector) => {
                tracing::debug!("key exchange complete");
                outcome = Ok(Arc::clone(&protector));
                KexState::Complete
            }
            other => {
                outcome = Err(Error::UnexpectedMessage);
                other
            }
        });

        outcome
    }
}

fn build_our_kex_init() -> message::KexInit {
    let mut cookie = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut cookie);

    message::KexInit {
        cookie,
        kex_algorithms: algorithm::KEX.iter().map(|s| s.to_string()).collect(),
        server_host_key_algorithms: algorithm::HOST_KEY.iter().map(|s| s.to_string()).collect(),
        encryption_algorithms_client_to_server: vec![algorithm::CIPHER.to_string()],
        encryption_algorithms_server_to_client: vec![algorithm::CIPHER.to_string()],
        mac_algorithms_client_to_server: vec![algorithm::HMAC.to_string()],
        mac_algorithms_server_to_client: vec![algorithm::HMAC.to_string()],
        compression_algorithms_client_to_server: vec![algorithm::COMPRESS.to_string()],
        compression_algorithms_server_to_client: vec![algorithm::COMPRESS.to_string()],
        languages_client_to_server: vec![],
        languages_server_to_client: vec![],
        first_kex_packet_follows: false,
    }
}

fn negotiate(
    v_c: &[u8],
    v_s: &[u8],
    we_are_client: bool,
    ours: &message::KexInit,
    peer: &message::KexInit,
) -> Result<(Exchanger, bool)> {
    let (client_msg, server_msg) = if we_are_client { (ours, peer) } else { (peer, ours) };

    let negotiated = algorithm::negotiate_kex(client_msg, server_msg, !we_are_client)?;

    algorithm::negotiate_cipher(&peer.encryption_algorithms_client_to_server)?;
    algorithm::negotiate_cipher(&peer.encryption_algorithms_server_to_client)?;
    algorithm::negotiate_hmac(&peer.mac_algorithms_client_to_server)?;
    algorithm::negotiate_hmac(&peer.mac_algorithms_server_to_client)?;
    algorithm::negotiate_compress(&peer.compression_algorithms_client_to_server)?;
    algorithm::negotiate_compress(&peer.compression_algorithms_server_to_client)?;

    let hash = ExchangeHash::new(v_c, v_s).with_kexinit(&client_msg.exchange_bytes(), &server_msg.exchange_bytes());

    Ok((Exchanger::new(hash, negotiated.kex), negotiated.wrong_guess))
}

fn finalize_negotiation(
    we_are_client: bool,
    exchanger: Exchanger,
    wrong_guess: bool,
) -> (KexState, Option<message::EcdhInit>) {
    if we_are_client {
        let (pending, init) = exchanger.begin_as_client();
        (KexState::KexInitSent(pending), Some(init))
    } else if wrong_guess {
        (KexState::AwaitingKexInitWrongGuess(exchanger), None)
    } else {
        (KexState::AwaitingKexInit(exchanger), None)
    }
}
