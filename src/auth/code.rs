use rand::Rng;
use time::OffsetDateTime;

use crate::auth::password;
use crate::error::AppError;

/// How long an emailed login code stays valid.
pub const LOGIN_CODE_TTL: time::Duration = time::Duration::minutes(15);

/// Produce a uniformly random 6-digit login code and its hash. Only the hash
/// is stored; the plaintext goes out by email once and is never logged.
pub fn generate() -> anyhow::Result<(String, String)> {
    let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();
    let hash = password::hash_secret(&code)?;
    Ok((code, hash))
}

/// Check a submitted code against the stored hash and expiry. Expiry is
/// checked first; a stale code reports `CodeExpired` even if it matches.
pub fn validate(
    input: &str,
    stored_hash: &str,
    expiry: OffsetDateTime,
    now: OffsetDateTime,
) -> Result<(), AppError> {
    if expiry <= now {
        return Err(AppError::CodeExpired);
    }
    match password::verify_secret(input, stored_hash) {
        Ok(true) => Ok(()),
        // A malformed stored hash is indistinguishable from a mismatch to the
        // caller; both reject without an oracle.
        Ok(false) | Err(_) => Err(AppError::InvalidCode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_is_six_digits_in_range() {
        for _ in 0..32 {
            let (code, _) = generate().unwrap();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn code_verifies_against_its_hash_only() {
        let (code, hash) = generate().unwrap();
        let future = OffsetDateTime::now_utc() + time::Duration::minutes(10);
        let now = OffsetDateTime::now_utc();
        assert!(validate(&code, &hash, future, now).is_ok());
        assert!(matches!(
            validate("000000", &hash, future, now),
            Err(AppError::InvalidCode)
        ));
    }

    #[test]
    fn expired_code_reports_expiry_before_mismatch() {
        let (code, hash) = generate().unwrap();
        let now = OffsetDateTime::now_utc();
        let past = now - time::Duration::minutes(1);
        assert!(matches!(
            validate(&code, &hash, past, now),
            Err(AppError::CodeExpired)
        ));
        // Even a wrong code reports expiry once the window is over.
        assert!(matches!(
            validate("000000", &hash, past, now),
            Err(AppError::CodeExpired)
        ));
    }
}
