//! Cryptographically secure random tokens for session ids and remember
//! tokens.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Generate a random alphanumeric token of the given length.
///
/// Each character carries ~5.95 bits of entropy, so 32 characters give
/// ~190 bits — comfortably above the 128-bit floor for session ids.
pub fn secure_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length_and_charset() {
        let token = secure_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| secure_token(32)).collect();
        assert_eq!(tokens.len(), 100);
    }
}
