//! PKCE (Proof Key for Code Exchange) helpers, RFC 7636
//!
//! Microsoft's public-client registrations require PKCE on the authorization
//! code grant; confidential clients accept it as well, so the flow sends a
//! challenge unless it is switched off in [`super::OAuthConfig`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of random bytes behind verifiers and state tokens (43 chars encoded).
const TOKEN_BYTES: usize = 32;

fn random_token() -> Result<String, String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().try_fill_bytes(&mut bytes).map_err(|e| e.to_string())?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate a code verifier.
///
/// # Errors
/// Returns error if the system random source fails
pub fn generate_code_verifier() -> Result<String, String> {
    random_token()
}

/// `BASE64URL(SHA256(ASCII(verifier)))`
///
/// # Errors
/// Returns error if the verifier is empty
pub fn generate_code_challenge(verifier: &str) -> Result<String, String> {
    if verifier.is_empty() {
        return Err("code verifier must not be empty".to_string());
    }
    let hash = Sha256::digest(verifier.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(hash))
}

/// Generate a random `state` value for CSRF protection.
///
/// # Errors
/// Returns error if the system random source fails
pub fn generate_state() -> Result<String, String> {
    random_token()
}

/// Compare the state sent with the one received, in constant time.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    let (a, b) = (expected.as_bytes(), actual.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verifier, challenge and state for one authorization attempt.
///
/// Serializable so a login started in one process can be completed in
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PKCEChallenge {
    /// Kept locally until the code is exchanged
    pub code_verifier: String,

    /// Sent with the authorization request
    pub code_challenge: String,

    /// Must come back unchanged on the redirect
    pub state: String,
}

impl PKCEChallenge {
    /// Generate a fresh challenge.
    ///
    /// # Examples
    /// ```
    /// use graphkit_common::auth::pkce::PKCEChallenge;
    ///
    /// let challenge = PKCEChallenge::generate().unwrap();
    /// assert_eq!(challenge.code_verifier.len(), 43);
    /// ```
    ///
    /// # Errors
    /// Returns error if the system random source fails
    pub fn generate() -> Result<Self, String> {
        let code_verifier = generate_code_verifier()?;
        let code_challenge = generate_code_challenge(&code_verifier)?;
        let state = generate_state()?;

        Ok(Self { code_verifier, code_challenge, state })
    }

    /// Always "S256"
    #[must_use]
    pub fn challenge_method(&self) -> &str {
        "S256"
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Validates `PKCEChallenge::generate` behavior for the verifier length
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the verifier stays inside the RFC 7636 43-128 range.
    /// - Ensures the state is not empty.
    #[test]
    fn test_generate_pkce_challenge() {
        let challenge = PKCEChallenge::generate().unwrap();

        assert!((43..=128).contains(&challenge.code_verifier.len()));
        assert!(!challenge.code_challenge.is_empty());
        assert!(!challenge.state.is_empty());
        assert_eq!(challenge.challenge_method(), "S256");
    }

    /// Validates `PKCEChallenge::generate` behavior for the unique challenges
    /// scenario.
    #[test]
    fn test_unique_challenges() {
        let first = PKCEChallenge::generate().unwrap();
        let second = PKCEChallenge::generate().unwrap();

        assert_ne!(first.code_verifier, second.code_verifier);
        assert_ne!(first.state, second.state);
    }

    /// Validates `generate_code_challenge` against the RFC 7636 appendix B
    /// example.
    #[test]
    fn test_rfc7636_vector() {
        let challenge =
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk").unwrap();
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    /// Validates `generate_code_challenge` behavior for the empty verifier
    /// scenario.
    #[test]
    fn test_empty_verifier_rejected() {
        assert!(generate_code_challenge("").is_err());
    }

    /// Validates `validate_state` behavior for matching and mismatching
    /// values.
    #[test]
    fn test_validate_state() {
        assert!(validate_state("abc123", "abc123"));
        assert!(!validate_state("abc123", "abc124"));
        assert!(!validate_state("abc123", "abc12"));
        assert!(!validate_state("", "x"));
    }

    /// Validates `PKCEChallenge::generate` behavior for the base64url encoding
    /// scenario.
    #[test]
    fn test_base64url_encoding() {
        let challenge = PKCEChallenge::generate().unwrap();

        for value in [&challenge.code_verifier, &challenge.code_challenge, &challenge.state] {
            assert!(!value.contains('='));
            assert!(!value.contains('+'));
            assert!(!value.contains('/'));
        }
    }
}
