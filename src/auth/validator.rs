use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

use super::{AuthError, Claims, TokenRejection, SIGNING_ALGORITHM};
use crate::config::ConfigError;

/// Claims as they arrive on the wire, before required fields are checked
#[derive(Debug, Deserialize)]
struct WireClaims {
    identity_id: Option<String>,
    role: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
}

/// Stateless token verification: signature, algorithm, expiry, claims
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validate a raw `Authorization` header value (with or without the
    /// `Bearer` scheme) and return its claims.
    pub fn validate(&self, raw_header_value: &str) -> Result<Claims, AuthError> {
        self.validate_at(raw_header_value, Utc::now().timestamp())
            .map_err(|reason| {
                debug!("Rejected token: {}", reason);
                AuthError::Unauthorized(reason)
            })
    }

    fn validate_at(&self, raw_header_value: &str, now: i64) -> Result<Claims, TokenRejection> {
        let token = strip_scheme(raw_header_value);
        if token.is_empty() {
            return Err(TokenRejection::Missing);
        }

        // Checked before the signature so a forged header never reaches key handling.
        let header = decode_header(token).map_err(|_| TokenRejection::Malformed)?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(TokenRejection::WrongAlgorithm);
        }

        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| rejection_for(e.kind()))?;
        let wire = data.claims;

        let exp = wire.exp.ok_or(TokenRejection::MissingClaim("exp"))?;
        if exp <= now {
            return Err(TokenRejection::Expired);
        }
        let identity_id = wire
            .identity_id
            .filter(|id| !id.is_empty())
            .ok_or(TokenRejection::MissingClaim("identity_id"))?;
        let role = wire
            .role
            .filter(|role| !role.is_empty())
            .ok_or(TokenRejection::MissingClaim("role"))?;

        Ok(Claims {
            identity_id,
            role,
            exp,
            iat: wire.iat.unwrap_or_default(),
        })
    }
}

/// Drop an optional, case-insensitive `Bearer` scheme.
fn strip_scheme(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => raw[7..].trim(),
        _ => raw,
    }
}

fn rejection_for(kind: &ErrorKind) -> TokenRejection {
    match kind {
        ErrorKind::InvalidSignature => TokenRejection::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => TokenRejection::WrongAlgorithm,
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        ErrorKind::MissingRequiredClaim(_) => TokenRejection::MissingClaim("exp"),
        _ => TokenRejection::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, TokenIssuer};
    use crate::database::Role;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret-key-12345";

    fn identity() -> Identity {
        Identity { id: "user-1".to_string(), role: Role::User }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, chrono::Duration::hours(72)).unwrap()
    }

    fn reason(result: Result<Claims, AuthError>) -> TokenRejection {
        match result {
            Err(AuthError::Unauthorized(reason)) => reason,
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    fn forge(alg: Algorithm, secret: &str, claims: serde_json::Value) -> String {
        encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn round_trip_returns_issued_claims() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let issued = issuer().issue(&identity()).unwrap();

        let claims = validator.validate(&format!("Bearer {}", issued.token)).unwrap();
        assert_eq!(claims.identity_id, "user-1");
        assert_eq!(claims.role, "user");
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn scheme_prefix_is_optional() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let issued = issuer().issue(&identity()).unwrap();

        assert!(validator.validate(&issued.token).is_ok());
        assert!(validator.validate(&format!("bearer {}", issued.token)).is_ok());
    }

    #[test]
    fn validation_is_idempotent() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let issued = issuer().issue(&identity()).unwrap();

        let first = validator.validate(&issued.token).unwrap();
        let second = validator.validate(&issued.token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn expired_token_is_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let past = Utc::now() - chrono::Duration::hours(100);
        let issued = issuer().issue_at(&identity(), past).unwrap();

        assert_eq!(reason(validator.validate(&issued.token)), TokenRejection::Expired);
    }

    #[test]
    fn expiry_equal_to_now_is_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let now = Utc::now().timestamp();
        let token = forge(
            Algorithm::HS256,
            SECRET,
            json!({ "identity_id": "user-1", "role": "user", "exp": now + 10 }),
        );

        assert!(validator.validate_at(&token, now + 9).is_ok());
        assert_eq!(validator.validate_at(&token, now + 10), Err(TokenRejection::Expired));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let other = TokenIssuer::new("another-secret", chrono::Duration::hours(72)).unwrap();
        let issued = other.issue(&identity()).unwrap();

        assert_eq!(reason(validator.validate(&issued.token)), TokenRejection::BadSignature);
    }

    #[test]
    fn other_hmac_variants_are_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let exp = Utc::now().timestamp() + 3600;
        let token = forge(
            Algorithm::HS512,
            SECRET,
            json!({ "identity_id": "user-1", "role": "user", "exp": exp }),
        );

        assert_eq!(reason(validator.validate(&token)), TokenRejection::WrongAlgorithm);
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        // {"alg":"none","typ":"JWT"} . {"identity_id":"user-1","role":"admin","exp":9999999999} .
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                     eyJpZGVudGl0eV9pZCI6InVzZXItMSIsInJvbGUiOiJhZG1pbiIsImV4cCI6OTk5OTk5OTk5OX0.";

        assert!(matches!(
            validator.validate(token),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let issued = issuer().issue(&identity()).unwrap();
        let admin = issuer()
            .issue(&Identity { id: "user-1".to_string(), role: Role::Admin })
            .unwrap();

        // Splice the admin payload onto the user token's signature.
        let user_parts: Vec<&str> = issued.token.split('.').collect();
        let admin_parts: Vec<&str> = admin.token.split('.').collect();
        let spliced = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert_eq!(reason(validator.validate(&spliced)), TokenRejection::BadSignature);
    }

    #[test]
    fn missing_and_garbage_tokens_are_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();

        assert_eq!(reason(validator.validate("")), TokenRejection::Missing);
        assert_eq!(reason(validator.validate("Bearer   ")), TokenRejection::Missing);
        assert_eq!(reason(validator.validate("not-a-jwt")), TokenRejection::Malformed);
        assert_eq!(reason(validator.validate("a.b.c")), TokenRejection::Malformed);
    }

    #[test]
    fn missing_claims_are_rejected() {
        let validator = TokenValidator::new(SECRET).unwrap();
        let exp = Utc::now().timestamp() + 3600;

        let no_identity = forge(Algorithm::HS256, SECRET, json!({ "role": "user", "exp": exp }));
        assert_eq!(
            reason(validator.validate(&no_identity)),
            TokenRejection::MissingClaim("identity_id")
        );

        let no_role = forge(Algorithm::HS256, SECRET, json!({ "identity_id": "u", "exp": exp }));
        assert_eq!(reason(validator.validate(&no_role)), TokenRejection::MissingClaim("role"));

        let no_exp = forge(Algorithm::HS256, SECRET, json!({ "identity_id": "u", "role": "user" }));
        assert_eq!(reason(validator.validate(&no_exp)), TokenRejection::MissingClaim("exp"));
    }
}
