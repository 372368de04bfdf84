//! Directional key-stream derivation, per RFC 4253 §7.2.
//!
//! Six keyed streams are derived from the shared secret `K`, the exchange
//! hash `H` and the session identifier: initialization vectors and
//! encryption keys for each direction, plus (unused here, since
//! AES-256-GCM is self-authenticating) integrity keys.

use digest::{Digest, FixedOutputReset};
use secrecy::{ExposeSecret, SecretBox};
use sha2::Sha256;

/// AES-256-GCM key sizes, per RFC 5647: 32-byte keys, 12-byte IVs, no separate MAC key.
pub const KEY_LEN: usize = 32;

/// AES-256-GCM IV size.
pub const IV_LEN: usize = 12;

/// The two keyed values the transport protector needs for one direction.
#[derive(Debug)]
pub struct DirectionalKeys {
    /// The initialization vector for this direction's cipher.
    pub iv: SecretBox<[u8; IV_LEN]>,

    /// The encryption key for this direction's cipher.
    pub key: SecretBox<[u8; KEY_LEN]>,
}

/// Both directions' keys, derived from a single completed key-exchange.
#[derive(Debug)]
pub struct SessionKeys {
    /// Client-to-server keys.
    pub client_to_server: DirectionalKeys,

    /// Server-to-client keys.
    pub server_to_client: DirectionalKeys,
}

impl SessionKeys {
    /// Derive both directions' IV and encryption keys from the shared
    /// secret `k`, exchange hash `h` and `session_id` (the first exchange
    /// hash of the connection).
    pub fn derive(k: &[u8], h: &[u8; 32], session_id: &[u8; 32]) -> Self {
        // `K` is hashed in as an SSH `mpint`: a leading zero byte is inserted
        // whenever the high bit of the first byte would otherwise be set.
        let leading_zero = k.first().is_some_and(|b| b & 0x80 != 0);
        let mut k_mpint = Vec::with_capacity(k.len() + leading_zero as usize);
        if leading_zero {
            k_mpint.push(0);
        }
        k_mpint.extend_from_slice(k);

        Self {
            client_to_server: DirectionalKeys {
                iv: derive::<IV_LEN>(&k_mpint, h, b'A', session_id),
                key: derive::<KEY_LEN>(&k_mpint, h, b'C', session_id),
            },
            server_to_client: DirectionalKeys {
                iv: derive::<IV_LEN>(&k_mpint, h, b'B', session_id),
                key: derive::<KEY_LEN>(&k_mpint, h, b'D', session_id),
            },
        }
    }
}

/// `k_mpint` is the shared secret's SSH `mpint` body (see [`SessionKeys::derive`]).
fn derive<const N: usize>(
    k_mpint: &[u8],
    h: &[u8; 32],
    letter: u8,
    session_id: &[u8],
) -> SecretBox<[u8; N]> {
    let mut digest = Sha256::new()
        .chain_update((k_mpint.len() as u32).to_be_bytes())
        .chain_update(k_mpint)
        .chain_update(h)
        .chain_update([letter])
        .chain_update(session_id)
        .finalize_reset();

    let mut material: Vec<u8> = digest.to_vec();

    while material.len() < N {
        digest = Sha256::new()
            .chain_update((k_mpint.len() as u32).to_be_bytes())
            .chain_update(k_mpint)
            .chain_update(h)
            .chain_update(&material)
            .finalize_reset();

        material.extend_from_slice(&digest);
    }

    material.truncate(N);

    let mut array = [0u8; N];
    array.copy_from_slice(&material);

    SecretBox::new(Box::new(array))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let k = [0x01u8; 32];
        let h = [0x02u8; 32];
        let session_id = [0x03u8; 32];

        let a = SessionKeys::derive(&k, &h, &session_id);
        let b = SessionKeys::derive(&k, &h, &session_id);

        assert_eq!(
            a.client_to_server.key.expose_secret(),
            b.client_to_server.key.expose_secret()
        );
        assert_eq!(
            a.server_to_client.iv.expose_secret(),
            b.server_to_client.iv.expose_secret()
        );
    }

    #[test]
    fn directions_yield_distinct_keys() {
        let k = [0x42u8; 32];
        let h = [0x13u8; 32];
        let session_id = [0x37u8; 32];

        let keys = SessionKeys::derive(&k, &h, &session_id);

        assert_ne!(
            keys.client_to_server.key.expose_secret(),
            keys.server_to_client.key.expose_secret()
        );
    }
}
