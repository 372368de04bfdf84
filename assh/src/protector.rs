//! The transport protection factory: given derived key material, constructs
//! the AES-256-GCM OpenSSH-variant protector that the I/O layer installs on
//! `NEWKEYS`.
//!
//! Per RFC 5647, the 12-byte IV is split into a 4-byte fixed prefix and an
//! 8-byte invocation counter that increments, big-endian, once per packet
//! sent in that direction. Actually applying the protector to framed SSH
//! packets (length field as associated data, padding, sequence bookkeeping
//! beyond the counter) is the connection I/O pipeline's job, out of scope here.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::keys::{DirectionalKeys, SessionKeys, IV_LEN};

/// Failure while sealing or opening a packet through the transport protector.
#[derive(Debug, Error)]
#[error("AES-256-GCM authentication or encryption failure")]
pub struct CryptoFailure;

struct Direction {
    cipher: Aes256Gcm,
    iv: [u8; IV_LEN],
    counter: u64,
}

impl Direction {
    fn new(keys: DirectionalKeys) -> Self {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(keys.key.expose_secret()));

        Self {
            cipher,
            iv: *keys.iv.expose_secret(),
            counter: 0,
        }
    }

    fn nonce(&self) -> Nonce {
        let mut nonce = self.iv;
        let fixed = &self.iv[..4];
        let invocation = (u64::from_be_bytes(self.iv[4..].try_into().expect("iv is 12 bytes")))
            .wrapping_add(self.counter);

        nonce[..4].copy_from_slice(fixed);
        nonce[4..].copy_from_slice(&invocation.to_be_bytes());

        *Nonce::from_slice(&nonce)
    }

    fn advance(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }
}

/// An installed AES-256-GCM transport protector, holding one direction's
/// worth of key material per side.
///
/// Constructed once, at `KeysExchanged`; ownership passes to the I/O layer
/// when `NEWKEYS` crosses. It is never rekeyed (rekeying is a non-goal of
/// this core).
pub struct TransportProtector {
    encrypt: Direction,
    decrypt: Direction,
}

impl TransportProtector {
    /// Build a protector from a completed key-exchange's derived [`SessionKeys`],
    /// given which direction is ours to encrypt.
    pub fn new(keys: SessionKeys, we_are_client: bool) -> Self {
        let (encrypt, decrypt) = if we_are_client {
            (keys.client_to_server, keys.server_to_client)
        } else {
            (keys.server_to_client, keys.client_to_server)
        };

        Self {
            encrypt: Direction::new(encrypt),
            decrypt: Direction::new(decrypt),
        }
    }

    /// Seal one outbound packet payload, producing ciphertext with the
    /// authentication tag appended, and advance the outbound invocation counter.
    pub fn seal(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
        let sealed = self
            .encrypt
            .cipher
            .encrypt(&self.encrypt.nonce(), plaintext)
            .map_err(|_| CryptoFailure)?;

        self.encrypt.advance();

        Ok(sealed)
    }

    /// Open one inbound packet payload (ciphertext with the authentication
    /// tag appended), and advance the inbound invocation counter.
    pub fn open(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
        let opened = self
            .decrypt
            .cipher
            .decrypt(&self.decrypt.nonce(), ciphertext)
            .map_err(|_| CryptoFailure)?;

        self.decrypt.advance();

        Ok(opened)
    }
}

impl std::fmt::Debug for TransportProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportProtector")
            .field("cipher", &"aes256-gcm@openssh.com")
            .finish_non_exhaustive()
    }
}
