//! Cryptographic Utilities

use rand::RngCore;

// Largest multiple of 10 that fits in a byte. Bytes at or above this are
// rejected so that `byte % 10` maps uniformly onto the digit alphabet.
const DIGIT_REJECTION_BOUND: u8 = 250;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random numeric code of `len` digits
///
/// Uses rejection sampling, so every digit is drawn uniformly and the
/// code carries the full `10^len` entropy.
pub fn random_numeric_code(len: usize) -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while code.len() < len {
        rng.fill_bytes(&mut buf);
        for &byte in &buf {
            if byte >= DIGIT_REJECTION_BOUND {
                continue;
            }
            code.push(char::from(b'0' + byte % 10));
            if code.len() == len {
                break;
            }
        }
    }

    code
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
