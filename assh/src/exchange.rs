//! The exchange-bytes accumulator and hash, per RFC 4253 §8.
//!
//! The buffer accumulates, in canonical order, every field hashed to form
//! the exchange hash `H` (which doubles as the session identifier on the
//! first key-exchange of a connection): `V_C`, `V_S`, `I_C`, `I_S`, `K_S`,
//! `Q_C`, `Q_S`, `K`. Each is a length-prefixed SSH string; `K` follows the
//! SSH `mpint` encoding rules (a leading zero byte is inserted whenever the
//! high bit of the first byte would otherwise be set, so the value always
//! reads as non-negative).

use sha2::{Digest, Sha256};

pub(crate) fn write_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

pub(crate) fn write_namelist(buf: &mut Vec<u8>, names: &[String]) {
    write_string(buf, names.join(",").as_bytes());
}

fn write_mpint(buf: &mut Vec<u8>, positive: &[u8]) {
    let leading_zero = positive.first().is_some_and(|b| b & 0x80 != 0);

    let len = positive.len() + leading_zero as usize;
    buf.extend_from_slice(&(len as u32).to_be_bytes());

    if leading_zero {
        buf.push(0);
    }
    buf.extend_from_slice(positive);
}

/// The accumulator for the fields hashed to produce the exchange hash `H`.
///
/// Built incrementally as the handshake progresses: the two version strings
/// are known at construction, `I_C`/`I_S` once both [`crate::message::KexInit`]s
/// have crossed, and `K_S`/`Q_C`/`Q_S`/`K` only once the ECDH exchange itself
/// has completed.
#[derive(Debug, Clone)]
pub struct ExchangeHash {
    buf: Vec<u8>,
}

impl ExchangeHash {
    /// Start the accumulator with the two version-identification strings,
    /// always in client-first, server-second order regardless of our own role.
    pub fn new(v_c: &[u8], v_s: &[u8]) -> Self {
        let mut buf = Vec::new();

        write_string(&mut buf, v_c);
        write_string(&mut buf, v_s);

        Self { buf }
    }

    /// Append the negotiated `I_C`/`I_S` [`crate::message::KexInit`] payloads.
    pub fn with_kexinit(mut self, i_c: &[u8], i_s: &[u8]) -> Self {
        write_string(&mut self.buf, i_c);
        write_string(&mut self.buf, i_s);

        self
    }

    /// Append the ECDH exchange fields and compute the resulting SHA-256 digest.
    ///
    /// `k` is the raw, unsigned big-endian shared secret, written using SSH
    /// `mpint` encoding.
    pub fn finish(mut self, k_s: &[u8], q_c: &[u8], q_s: &[u8], k: &[u8]) -> [u8; 32] {
        write_string(&mut self.buf, k_s);
        write_string(&mut self.buf, q_c);
        write_string(&mut self.buf, q_s);
        write_mpint(&mut self.buf, k);

        Sha256::digest(&self.buf).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpint_encoding_inserts_leading_zero_for_high_bit() {
        let mut buf = Vec::new();
        write_mpint(&mut buf, &[0x80, 0x01]);

        assert_eq!(buf, [0, 0, 0, 3, 0, 0x80, 0x01]);
    }

    #[test]
    fn mpint_encoding_skips_leading_zero_when_unneeded() {
        let mut buf = Vec::new();
        write_mpint(&mut buf, &[0x7f, 0x01]);

        assert_eq!(buf, [0, 0, 0, 2, 0x7f, 0x01]);
    }

    #[test]
    fn namelist_joins_with_commas() {
        let mut buf = Vec::new();
        write_namelist(&mut buf, &["a".into(), "b".into(), "c".into()]);

        assert_eq!(buf, [0, 0, 0, 5, b'a', b',', b'b', b',', b'c']);
    }
}
