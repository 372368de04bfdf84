//! The handful of `SSH-TRANS` messages the key-exchange state machine emits and consumes.
//!
//! These are already-decoded Rust values: turning them into and out of the
//! SSH binary packet protocol is the job of the surrounding codec, which is
//! out of scope for this crate. The one exception is [`KexInit::exchange_bytes`],
//! which re-encodes the message in the exact canonical form required to feed
//! the exchange hash -- that encoding is part of the key-exchange itself, not
//! of the general-purpose codec.

/// The `SSH_MSG_KEXINIT` (20) message, advertising the algorithms a side supports.
#[derive(Debug, Clone, PartialEq)]
pub struct KexInit {
    /// Random cookie, unused beyond being hashed into the exchange.
    pub cookie: [u8; 16],

    /// Key-exchange algorithms, in preference order.
    pub kex_algorithms: Vec<String>,

    /// Host-key algorithms, in preference order.
    pub server_host_key_algorithms: Vec<String>,

    /// Client-to-server cipher algorithms, in preference order.
    pub encryption_algorithms_client_to_server: Vec<String>,

    /// Server-to-client cipher algorithms, in preference order.
    pub encryption_algorithms_server_to_client: Vec<String>,

    /// Client-to-server MAC algorithms, in preference order.
    pub mac_algorithms_client_to_server: Vec<String>,

    /// Server-to-client MAC algorithms, in preference order.
    pub mac_algorithms_server_to_client: Vec<String>,

    /// Client-to-server compression algorithms, in preference order.
    pub compression_algorithms_client_to_server: Vec<String>,

    /// Server-to-client compression algorithms, in preference order.
    pub compression_algorithms_server_to_client: Vec<String>,

    /// Client-to-server languages, in preference order (unused).
    pub languages_client_to_server: Vec<String>,

    /// Server-to-client languages, in preference order (unused).
    pub languages_server_to_client: Vec<String>,

    /// Whether a guessed `SSH_MSG_KEX_ECDH_INIT` immediately follows this message.
    pub first_kex_packet_follows: bool,
}

impl KexInit {
    /// Re-encode this message in the canonical form fed to the exchange hash
    /// (`I_C`/`I_S` in RFC 4253 §8), i.e. as it would appear on the wire,
    /// without the leading packet length/padding framing.
    pub fn exchange_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.push(20u8); // SSH_MSG_KEXINIT
        buf.extend_from_slice(&self.cookie);

        crate::exchange::write_namelist(&mut buf, &self.kex_algorithms);
        crate::exchange::write_namelist(&mut buf, &self.server_host_key_algorithms);
        crate::exchange::write_namelist(&mut buf, &self.encryption_algorithms_client_to_server);
        crate::exchange::write_namelist(&mut buf, &self.encryption_algorithms_server_to_client);
        crate::exchange::write_namelist(&mut buf, &self.mac_algorithms_client_to_server);
        crate::exchange::write_namelist(&mut buf, &self.mac_algorithms_server_to_client);
        crate::exchange::write_namelist(&mut buf, &self.compression_algorithms_client_to_server);
        crate::exchange::write_namelist(&mut buf, &self.compression_algorithms_server_to_client);
        crate::exchange::write_namelist(&mut buf, &self.languages_client_to_server);
        crate::exchange::write_namelist(&mut buf, &self.languages_server_to_client);

        buf.push(self.first_kex_packet_follows as u8);
        buf.extend_from_slice(&0u32.to_be_bytes()); // reserved

        buf
    }
}

/// The `SSH_MSG_KEX_ECDH_INIT` (30) message, carrying the client's ephemeral public key.
#[derive(Debug, Clone, PartialEq)]
pub struct EcdhInit {
    /// `Q_C`, the client's ephemeral Curve25519 public key.
    pub q_c: [u8; 32],
}

/// The `SSH_MSG_KEX_ECDH_REPLY` (31) message, carrying the server's reply to the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct EcdhReply {
    /// `K_S`, the server's host public key blob.
    pub server_host_key: Vec<u8>,

    /// `Q_S`, the server's ephemeral Curve25519 public key.
    pub server_ephemeral: [u8; 32],

    /// The signature of the exchange hash, made with the server's host key.
    pub signature: Vec<u8>,
}

/// The `SSH_MSG_NEWKEYS` (21) message, with no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewKeys;
