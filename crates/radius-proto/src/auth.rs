//! Authenticator computation and the MD5-based credential primitives.
//!
//! The 16-byte authenticator binds a packet to its shared secret and, for
//! replies, to the originating request (RFC 2865 Section 3, RFC 2866
//! Section 3, RFC 5176 Section 2.3):
//!
//! - Access-Request carries a random authenticator chosen at construction
//!   time; encoding copies it unmodified.
//! - Accounting-Request, Disconnect-Request, and CoA-Request hash the
//!   packet with the authenticator field zeroed.
//! - Every response hashes the packet with the request authenticator in
//!   place; the result overwrites the field.

use crate::packet::PacketCode;
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("empty secret")]
    EmptySecret,
    #[error("invalid scrambled password length: {0}")]
    InvalidPasswordLength(usize),
}

/// Generates a random request authenticator (RFC 2865 Section 3).
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut authenticator = [0u8; 16];
    rand::rng().fill(&mut authenticator);
    authenticator
}

/// Computes the authenticator for an encoded packet.
///
/// `raw` is the full encoded packet with its length field already written.
/// For the three request codes that hash over a zeroed authenticator field,
/// bytes 4..20 are zeroed in place before hashing. Codes with a
/// caller-supplied authenticator (Access-Request, Status-Server,
/// Status-Client) pass their current field through unchanged.
pub fn compute_authenticator(raw: &mut [u8], secret: &str) -> [u8; 16] {
    let mut authenticator = [0u8; 16];
    if raw.len() < 20 {
        return authenticator;
    }
    match PacketCode::from_u8(raw[0]) {
        Some(
            PacketCode::AccountingRequest
            | PacketCode::DisconnectRequest
            | PacketCode::CoARequest,
        ) => {
            raw[4..20].fill(0);
            authenticator = hash_with_secret(raw, secret);
        }
        Some(
            PacketCode::AccessAccept
            | PacketCode::AccessReject
            | PacketCode::AccessChallenge
            | PacketCode::AccountingResponse
            | PacketCode::DisconnectACK
            | PacketCode::DisconnectNAK
            | PacketCode::CoAACK
            | PacketCode::CoANAK,
        ) => {
            authenticator = hash_with_secret(raw, secret);
        }
        _ => {
            authenticator.copy_from_slice(&raw[4..20]);
        }
    }
    authenticator
}

fn hash_with_secret(raw: &[u8], secret: &str) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume(raw);
    ctx.consume(secret.as_bytes());
    ctx.compute().0
}

/// Verifies a reply against the authenticator of the original request.
///
/// The received authenticator is saved, the request authenticator is
/// substituted into bytes 4..20, and the recomputed hash is compared
/// byte-wise against the received value.
pub fn is_authentic(raw: &[u8], secret: &str, request_authenticator: &[u8; 16]) -> bool {
    if raw.len() < 20 {
        return false;
    }
    let mut scratch = raw.to_vec();
    scratch[4..20].copy_from_slice(request_authenticator);
    let expected = compute_authenticator(&mut scratch, secret);
    expected == raw[4..20]
}

/// Verifies the request authenticator of a received packet before decoding.
///
/// Only Accounting-Request carries a verifiable request authenticator
/// (MD5 over the packet with the authenticator field zeroed); every other
/// code is admitted and left to per-attribute validation.
pub fn is_authentic_request(request: &[u8], secret: &str) -> bool {
    if request.len() < 20 || secret.is_empty() {
        return false;
    }
    match PacketCode::from_u8(request[0]) {
        Some(PacketCode::AccountingRequest) => {
            let mut ctx = md5::Context::new();
            ctx.consume(&request[..4]);
            ctx.consume([0u8; 16]);
            ctx.consume(&request[20..]);
            ctx.consume(secret.as_bytes());
            ctx.compute().0 == request[4..20]
        }
        _ => true,
    }
}

/// Scrambles a User-Password value for the wire (RFC 2865 Section 5.2).
///
/// The password is padded with NULs to a multiple of 16 bytes, then each
/// 16-byte chunk is XORed with `MD5(secret ‖ previous_ciphertext_chunk)`,
/// seeding the chain with the request authenticator.
pub fn encode_user_password(password: &[u8], secret: &[u8], authenticator: &[u8]) -> Vec<u8> {
    let mut padded = password.to_vec();
    let trailing = padded.len() % 16;
    if trailing != 0 || padded.is_empty() {
        padded.resize(padded.len() + 16 - trailing, 0);
    }
    let mut scrambled = Vec::with_capacity(padded.len());
    let mut prev = authenticator.to_vec();
    for chunk in padded.chunks(16) {
        let digest = password_digest(secret, &prev);
        let mut block = [0u8; 16];
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = chunk[i] ^ digest[i];
        }
        prev = block.to_vec();
        scrambled.extend_from_slice(&block);
    }
    scrambled
}

/// Recovers a User-Password value from its wire form, stripping the NUL
/// padding. The inverse of [`encode_user_password`].
pub fn decode_user_password(
    scrambled: &[u8],
    secret: &str,
    authenticator: &[u8],
) -> Result<Vec<u8>, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::EmptySecret);
    }
    if scrambled.is_empty() || scrambled.len() % 16 != 0 {
        return Err(AuthError::InvalidPasswordLength(scrambled.len()));
    }
    let mut plain = Vec::with_capacity(scrambled.len());
    let mut prev = authenticator.to_vec();
    for chunk in scrambled.chunks(16) {
        let digest = password_digest(secret.as_bytes(), &prev);
        for (i, byte) in chunk.iter().enumerate() {
            plain.push(byte ^ digest[i]);
        }
        prev = chunk.to_vec();
    }
    while plain.last() == Some(&0) {
        plain.pop();
    }
    Ok(plain)
}

fn password_digest(secret: &[u8], prev: &[u8]) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume(secret);
    ctx.consume(prev);
    ctx.compute().0
}

/// Verifies a CHAP-Password attribute (RFC 2865 Section 5.3).
///
/// `chap_password` is the 17-byte attribute value `identifier ‖ response`;
/// the response must equal `MD5(identifier ‖ password ‖ challenge)` where
/// the challenge is the request authenticator.
pub fn authenticate_chap(password: &[u8], authenticator: &[u8], chap_password: &[u8]) -> bool {
    let Some((ident, response)) = chap_password.split_first() else {
        return false;
    };
    if response.len() != 16 {
        return false;
    }
    let mut ctx = md5::Context::new();
    ctx.consume([*ident]);
    ctx.consume(password);
    ctx.consume(authenticator);
    ctx.compute().0 == *response
}

/// Builds a CHAP-Password attribute value from a plaintext password and the
/// request authenticator, using a random CHAP identifier.
pub fn encode_chap_password(password: &[u8], authenticator: &[u8]) -> Vec<u8> {
    let ident: u8 = rand::rng().random();
    let mut ctx = md5::Context::new();
    ctx.consume([ident]);
    ctx.consume(password);
    ctx.consume(authenticator);
    let digest = ctx.compute();
    let mut chap_password = Vec::with_capacity(17);
    chap_password.push(ident);
    chap_password.extend_from_slice(&digest.0);
    chap_password
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_AUTHENTICATOR: [u8; 16] = [
        0x2a, 0xee, 0x86, 0xf0, 0x8d, 0x0d, 0x55, 0x96, 0x9c, 0xa5, 0x97, 0x8e, 0x0d, 0x33, 0x67,
        0xa2,
    ];

    #[test]
    fn test_generate_request_authenticator_is_random() {
        let a = generate_request_authenticator();
        let b = generate_request_authenticator();
        assert_ne!(a, b);
    }

    #[test]
    fn test_access_request_authenticator_passes_through() {
        let mut raw = vec![0u8; 20];
        raw[0] = PacketCode::AccessRequest.as_u8();
        raw[4..20].copy_from_slice(&SAMPLE_AUTHENTICATOR);
        let authenticator = compute_authenticator(&mut raw, "CGRateS.org");
        assert_eq!(authenticator, SAMPLE_AUTHENTICATOR);
    }

    #[test]
    fn test_accounting_request_zeroes_field_before_hashing() {
        let mut raw = vec![0u8; 24];
        raw[0] = PacketCode::AccountingRequest.as_u8();
        raw[3] = 24;
        raw[4..20].copy_from_slice(&SAMPLE_AUTHENTICATOR);
        let authenticator = compute_authenticator(&mut raw, "secret");
        assert_eq!(&raw[4..20], [0u8; 16]);

        let mut hashed = raw.clone();
        hashed.extend_from_slice(b"secret");
        assert_eq!(authenticator, md5::compute(&hashed).0);
    }

    #[test]
    fn test_user_password_round_trip() {
        let password = b"CGRateSPassword1";
        let secret = "CGRateS.org";
        let scrambled = encode_user_password(password, secret.as_bytes(), &SAMPLE_AUTHENTICATOR);
        let plain = decode_user_password(&scrambled, secret, &SAMPLE_AUTHENTICATOR).unwrap();
        assert_eq!(plain, password.to_vec());
    }

    #[test]
    fn test_user_password_multi_chunk_round_trip() {
        let password = b"a password well over sixteen bytes long";
        let secret = "CGRateS.org";
        let scrambled = encode_user_password(password, secret.as_bytes(), &SAMPLE_AUTHENTICATOR);
        assert_eq!(scrambled.len(), 48);
        let plain = decode_user_password(&scrambled, secret, &SAMPLE_AUTHENTICATOR).unwrap();
        assert_eq!(plain, password.to_vec());
    }

    #[test]
    fn test_encode_user_password_fixture() {
        let plaintext = [
            0u8, 1, 2, 2, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 5, 6, 6, 6, 6, 6, 6, 7, 7, 7, 7, 7, 7,
            7, 8, 8, 8,
        ];
        let expected = [
            226u8, 208, 45, 207, 15, 37, 78, 236, 65, 229, 29, 215, 17, 0, 181, 221, 198, 34, 119,
            149, 128, 228, 244, 129, 211, 121, 23, 32, 210, 99, 255, 185,
        ];
        let scrambled = encode_user_password(&plaintext, b"encKey", &[]);
        assert_eq!(scrambled, expected.to_vec());
    }

    #[test]
    fn test_decode_user_password_fixture() {
        let scrambled = [
            0u8, 2, 2, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 5, 6, 6, 6, 6, 6, 6, 7, 7, 7, 7, 7, 7, 7,
            8, 8, 8, 8,
        ];
        let expected = [
            118u8, 92, 8, 36, 69, 208, 202, 142, 97, 114, 194, 148, 8, 37, 168, 182, 63, 59, 66,
            86, 140, 253, 145, 67, 226, 180, 228, 129, 85, 168, 237, 169,
        ];
        let plain = decode_user_password(&scrambled, "nonempty", &[0u8; 16]).unwrap();
        assert_eq!(plain, expected.to_vec());
    }

    #[test]
    fn test_decode_user_password_empty_secret() {
        assert_eq!(
            decode_user_password(&[0u8; 16], "", &[0u8; 16]).unwrap_err(),
            AuthError::EmptySecret
        );
    }

    #[test]
    fn test_decode_user_password_bad_length() {
        assert_eq!(
            decode_user_password(&[0u8; 15], "secret", &[0u8; 16]).unwrap_err(),
            AuthError::InvalidPasswordLength(15)
        );
    }

    #[test]
    fn test_encode_user_password_pads_empty() {
        let scrambled = encode_user_password(b"", b"secret", &SAMPLE_AUTHENTICATOR);
        assert_eq!(scrambled.len(), 16);
    }

    #[test]
    fn test_chap_round_trip() {
        let password = b"passwd";
        let chap_password = encode_chap_password(password, &SAMPLE_AUTHENTICATOR);
        assert_eq!(chap_password.len(), 17);
        assert!(authenticate_chap(
            password,
            &SAMPLE_AUTHENTICATOR,
            &chap_password
        ));
        assert!(!authenticate_chap(
            b"other",
            &SAMPLE_AUTHENTICATOR,
            &chap_password
        ));
    }

    #[test]
    fn test_chap_rejects_malformed_attribute() {
        assert!(!authenticate_chap(b"pw", &SAMPLE_AUTHENTICATOR, &[]));
        assert!(!authenticate_chap(b"pw", &SAMPLE_AUTHENTICATOR, &[1u8; 16]));
    }

    #[test]
    fn test_is_authentic_request_short_or_secretless() {
        assert!(!is_authentic_request(b"tooshort", "secret"));
        assert!(!is_authentic_request(&[0u8; 32], ""));
    }

    #[test]
    fn test_non_accounting_requests_are_admitted() {
        let mut raw = vec![0u8; 20];
        raw[0] = PacketCode::AccessRequest.as_u8();
        assert!(is_authentic_request(&raw, "secret"));
    }
}
