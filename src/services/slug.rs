// Public slug generation
// Slugs are 8 random characters from [a-z0-9]; uniqueness is enforced by the
// database constraint and callers retry on collision.

use rand::{thread_rng, Rng};

pub const SLUG_LENGTH: usize = 8;
pub const MAX_SLUG_ATTEMPTS: usize = 5;

const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_slug() -> String {
    let mut rng = thread_rng();
    (0..SLUG_LENGTH)
        .map(|_| SLUG_ALPHABET[rng.gen_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Shape check used to reject obviously bogus slugs before touching the database
pub fn is_plausible_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 32
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Whether a diesel error is a unique violation on the slug column
pub fn is_slug_collision(error: &diesel::result::Error) -> bool {
    use diesel::result::{DatabaseErrorKind, Error};

    match error {
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => info
            .constraint_name()
            .map(|name| name.contains("slug"))
            .unwrap_or(true),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug_shape() {
        for _ in 0..200 {
            let slug = generate_slug();
            assert_eq!(slug.len(), SLUG_LENGTH);
            assert!(slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_slugs_are_spread_out() {
        let slugs: HashSet<String> = (0..1000).map(|_| generate_slug()).collect();
        assert!(slugs.len() > 990);
    }

    #[test]
    fn test_plausible_slug() {
        assert!(is_plausible_slug("abc12345"));
        assert!(is_plausible_slug("legacy_code-1"));
        assert!(!is_plausible_slug(""));
        assert!(!is_plausible_slug("../etc/passwd"));
        assert!(!is_plausible_slug(&"a".repeat(33)));
    }

    #[test]
    fn test_other_errors_are_not_collisions() {
        assert!(!is_slug_collision(&diesel::result::Error::NotFound));
    }
}
