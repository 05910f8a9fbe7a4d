//! One-time password codes for phone login.

use chrono::{DateTime, Duration, Utc};

/// Generate a 6-digit OTP code.
#[must_use]
pub fn generate_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Expiry instant for a code issued now.
#[must_use]
pub fn expiry(expiry_minutes: i64) -> DateTime<Utc> {
    Utc::now() + Duration::minutes(expiry_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_format() {
        let code = generate_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_code_range() {
        for _ in 0..100 {
            let code: u32 = generate_code().parse().expect("valid number");
            assert!(code >= 100_000);
            assert!(code < 1_000_000);
        }
    }

    #[test]
    fn test_expiry_is_in_the_future() {
        let at = expiry(5);
        assert!(at > Utc::now());
        assert!(at <= Utc::now() + Duration::minutes(5));
    }
}
