use rand::distributions::Alphanumeric;
use rand::{rngs::OsRng, Rng};

/// Tracking token length. Alphanumerics carry ~5.95 bits each, so 32
/// characters give ~190 bits of entropy, comfortably past the 128-bit floor.
const TRACKING_TOKEN_LEN: usize = 32;

const REFERENCE_SUFFIX_LEN: usize = 6;

/// URL-safe, cryptographically random tracking token.
pub fn tracking_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TRACKING_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Human-readable booking reference, e.g. "ATB-7KQ2M9". Uppercase without
/// 0/O/1/I so it survives being read over the phone.
pub fn booking_reference() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = OsRng;
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("ATB-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tracking_tokens_are_long_and_url_safe() {
        let token = tracking_token();
        assert_eq!(token.len(), TRACKING_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tracking_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..100).map(|_| tracking_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn references_have_expected_shape() {
        let reference = booking_reference();
        assert!(reference.starts_with("ATB-"));
        assert_eq!(reference.len(), 4 + REFERENCE_SUFFIX_LEN);
        assert!(!reference.contains('0'));
        assert!(!reference.contains('O'));
        assert!(!reference.contains('1'));
        assert!(!reference.contains('I'));
    }
}
