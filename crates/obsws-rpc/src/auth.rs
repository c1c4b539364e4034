//! Challenge/response authentication.
//!
//! The server publishes a salt and a one-time challenge. The client proves it
//! knows the password by sending
//! `base64(sha256(base64(sha256(password + salt)) + challenge))`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const GET_AUTH_REQUIRED: &str = "GetAuthRequired";
pub const AUTHENTICATE: &str = "Authenticate";

/// Reply to `GetAuthRequired`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequirement {
    pub auth_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// Fields of the `Authenticate` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateParams {
    pub auth: String,
}

fn digest_b64(input: &str) -> String {
    STANDARD.encode(Sha256::digest(input.as_bytes()))
}

/// First round: the secret derived from password and salt.
#[must_use]
pub fn secret(password: &str, salt: &str) -> String {
    digest_b64(&format!("{password}{salt}"))
}

/// Both rounds: the value sent as the `auth` field.
#[must_use]
pub fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let secret = secret(password, salt);
    digest_b64(&format!("{secret}{challenge}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_vector() {
        assert_eq!(secret("p", "s"), "ZSfJNhovRpxSda/LXQblMBM2fNIxmV3hPcchhxE4g4I=");
        assert_eq!(
            auth_response("p", "s", "c"),
            "LEfh2WVBWpa8M06P7MehLXlToA1PtH2lNSNPjUZVYls="
        );
    }

    #[test]
    fn test_reference_vector_hunter2() {
        assert_eq!(
            auth_response("hunter2", "xyz", "abc"),
            "gggALJMRreGHuwQkY8IYrkendMLe5rKQb5ojN1UKqKQ="
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(secret("", ""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
        assert_eq!(
            auth_response("", "", ""),
            "XEB0z23rR/W2r5xf4+C70OQrlZb+iKxU1ca275h+DyA="
        );
    }

    #[test]
    fn test_response_is_deterministic_and_challenge_bound() {
        let a = auth_response("hunter2", "xyz", "abc");
        assert_eq!(a, auth_response("hunter2", "xyz", "abc"));
        assert_ne!(a, auth_response("hunter2", "xyz", "abd"));
        assert_ne!(a, auth_response("hunter3", "xyz", "abc"));
    }

    #[test]
    fn test_auth_requirement_not_required() {
        let req: AuthRequirement = serde_json::from_value(json!({"authRequired": false})).unwrap();
        assert!(!req.auth_required);
        assert!(req.challenge.is_none());
        assert!(req.salt.is_none());
    }

    #[test]
    fn test_auth_requirement_required() {
        let req: AuthRequirement = serde_json::from_value(json!({
            "authRequired": true,
            "challenge": "abc",
            "salt": "xyz"
        }))
        .unwrap();
        assert!(req.auth_required);
        assert_eq!(req.challenge.as_deref(), Some("abc"));
        assert_eq!(req.salt.as_deref(), Some("xyz"));
    }
}
