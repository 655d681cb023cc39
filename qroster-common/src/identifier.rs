//! External identifier generation
//!
//! Rows imported without an identifier column get one from [`generate`]:
//! eight random base-36 characters followed by the current Unix time in
//! milliseconds, also in base 36. Uniqueness is only enforced by the
//! store's constraint on `records.identifier`.

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of random characters prefixed to the time component
pub const RANDOM_LEN: usize = 8;

/// Generate a new external identifier
pub fn generate() -> String {
    let mut id = random_base36(RANDOM_LEN);
    id.push_str(&to_base36(Utc::now().timestamp_millis().max(0) as u64));
    id
}

/// Random lowercase base-36 string of `len` characters
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Render `value` in lowercase base 36
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_generate_shape() {
        let id = generate();
        assert!(id.len() > RANDOM_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generate_does_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }
}
