//! Random code generation

use rand::Rng;

use crate::constants::JOIN_CODE_ALPHABET;

/// Generate a random token over the given alphabet
pub fn generate_secure_token(length: usize, charset: &[u8]) -> String {
    let mut rng = rand::rng();

    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..charset.len());
            charset[idx] as char
        })
        .collect()
}

/// Generate a random team join code
pub fn generate_join_code(length: usize) -> String {
    generate_secure_token(length, JOIN_CODE_ALPHABET)
}
