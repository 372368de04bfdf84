//! Supported algorithms, advertised in every [`crate::message::KexInit`].
//!
//! Unlike a general-purpose SSH stack, this core is deliberately narrow: it
//! advertises exactly one key-exchange family (with its pre-RFC-8731 alias),
//! one host-key algorithm, one cipher and one MAC, and performs no fallback
//! beyond what RFC 4253 §7.1 requires to resolve the key-exchange family
//! itself. There is nothing left to "negotiate" for cipher/MAC/compression
//! beyond confirming the peer also understands our single choice.

use crate::{Error, Result};

/// The key-exchange algorithms we advertise, in preference order.
pub const KEX: [&str; 2] = ["curve25519-sha256", "curve25519-sha256@libssh.org"];

/// The host-key algorithms we advertise.
pub const HOST_KEY: [&str; 1] = ["ssh-ed25519"];

/// The cipher algorithm we advertise, in both directions.
pub const CIPHER: &str = "aes256-gcm@openssh.com";

/// The MAC algorithm we advertise, in both directions. Unused for AES-GCM
/// (which is self-authenticating) but still advertised for compliance with
/// peers that expect every mandatory-by-RFC4253 slot to be filled.
pub const HMAC: &str = "hmac-sha2-256";

/// The compression algorithm we advertise, in both directions.
pub const COMPRESS: &str = "none";

/// The outcome of negotiating the key-exchange algorithm (RFC 4253 §7.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// The chosen key-exchange algorithm name.
    pub kex: String,

    /// Whether the peer's `first_kex_packet_follows` guess disagreed with
    /// this negotiation's outcome, meaning the next `ECDH_INIT` must be discarded.
    pub wrong_guess: bool,
}

/// Negotiate the key-exchange algorithm and host-key algorithm, and determine
/// whether the peer's first-packet-follows guess was wrong.
///
/// `client` and `server` are the two [`crate::message::KexInit`] messages that
/// crossed on the wire; `peer` identifies which of the two belongs to the peer,
/// to evaluate its `first_kex_packet_follows` guess.
pub fn negotiate_kex(
    client: &crate::message::KexInit,
    server: &crate::message::KexInit,
    peer_is_client: bool,
) -> Result<Negotiated> {
    if !common(&client.server_host_key_algorithms, &server.server_host_key_algorithms) {
        return Err(Error::NoCommonHostKey);
    }

    let kex = if client.kex_algorithms.first() == server.kex_algorithms.first() {
        // Fast path (RFC 4253 §7.1, rule 1): both sides agree on their first pick.
        client
            .kex_algorithms
            .first()
            .cloned()
            .ok_or(Error::NoCommonKex)?
    } else {
        // Otherwise iterate the *client's* list, picking the first the server also supports.
        client
            .kex_algorithms
            .iter()
            .find(|alg| server.kex_algorithms.iter().any(|other| other == *alg))
            .cloned()
            .ok_or(Error::NoCommonKex)?
    };

    let peer = if peer_is_client { client } else { server };
    let wrong_guess = peer.first_kex_packet_follows
        && (peer.kex_algorithms.first() != Some(&kex)
            || peer.server_host_key_algorithms.first()
                != HOST_KEY.first().map(|s| s.to_string()).as_ref());

    Ok(Negotiated { kex, wrong_guess })
}

/// Confirm the peer also advertises our single cipher choice.
pub fn negotiate_cipher(peer: &[String]) -> Result<()> {
    single(peer, CIPHER, Error::NoCommonCipher)
}

/// Confirm the peer also advertises our single MAC choice.
pub fn negotiate_hmac(peer: &[String]) -> Result<()> {
    single(peer, HMAC, Error::NoCommonHmac)
}

/// Confirm the peer also advertises our single compression choice.
pub fn negotiate_compress(peer: &[String]) -> Result<()> {
    single(peer, COMPRESS, Error::NoCommonCompression)
}

fn single(peer: &[String], ours: &str, err: Error) -> Result<()> {
    if peer.iter().any(|alg| alg == ours) {
        Ok(())
    } else {
        Err(err)
    }
}

fn common(a: &[String], b: &[String]) -> bool {
    a.iter().any(|alg| b.iter().any(|other| other == alg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::KexInit;

    fn kexinit(kex_algorithms: &[&str], first_kex_packet_follows: bool) -> KexInit {
        KexInit {
            cookie: [0; 16],
            kex_algorithms: kex_algorithms.iter().map(|s| s.to_string()).collect(),
            server_host_key_algorithms: HOST_KEY.iter().map(|s| s.to_string()).collect(),
            encryption_algorithms_client_to_server: vec![CIPHER.to_string()],
            encryption_algorithms_server_to_client: vec![CIPHER.to_string()],
            mac_algorithms_client_to_server: vec![HMAC.to_string()],
            mac_algorithms_server_to_client: vec![HMAC.to_string()],
            compression_algorithms_client_to_server: vec![COMPRESS.to_string()],
            compression_algorithms_server_to_client: vec![COMPRESS.to_string()],
            languages_client_to_server: vec![],
            languages_server_to_client: vec![],
            first_kex_packet_follows,
        }
    }

    #[test]
    fn fast_path_when_both_sides_prefer_the_same_algorithm() {
        let client = kexinit(&["curve25519-sha256", "curve25519-sha256@libssh.org"], false);
        let server = kexinit(&["curve25519-sha256", "curve25519-sha256@libssh.org"], false);

        let negotiated = negotiate_kex(&client, &server, true).unwrap();

        assert_eq!(negotiated.kex, "curve25519-sha256");
        assert!(!negotiated.wrong_guess);
    }

    #[test]
    fn iterates_client_list_when_first_picks_disagree() {
        let client = kexinit(&["curve25519-sha256@libssh.org", "curve25519-sha256"], false);
        let server = kexinit(&["curve25519-sha256", "curve25519-sha256@libssh.org"], false);

        let negotiated = negotiate_kex(&client, &server, true).unwrap();

        assert_eq!(negotiated.kex, "curve25519-sha256@libssh.org");
    }

    #[test]
    fn wrong_guess_detected_when_peer_guessed_and_disagrees() {
        let client = kexinit(&["curve25519-sha256@libssh.org", "curve25519-sha256"], true);
        let server = kexinit(&["curve25519-sha256", "curve25519-sha256@libssh.org"], false);

        let negotiated = negotiate_kex(&client, &server, true).unwrap();

        assert_eq!(negotiated.kex, "curve25519-sha256@libssh.org");
        assert!(negotiated.wrong_guess);
    }

    #[test]
    fn no_wrong_guess_when_peer_guessed_correctly() {
        let client = kexinit(&["curve25519-sha256", "curve25519-sha256@libssh.org"], true);
        let server = kexinit(&["curve25519-sha256", "curve25519-sha256@libssh.org"], false);

        let negotiated = negotiate_kex(&client, &server, true).unwrap();

        assert!(!negotiated.wrong_guess);
    }

    #[test]
    fn no_common_kex_algorithm_fails() {
        let client = kexinit(&["curve25519-sha256"], false);
        let server = kexinit(&["curve25519-sha256@libssh.org"], false);

        assert!(matches!(
            negotiate_kex(&client, &server, true),
            Err(Error::NoCommonKex)
        ));
    }
}
