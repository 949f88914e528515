use crate::api::error::ApiError;
use crate::config::settings::TokenPayload;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

const AUDIENCE: &str = "met01.apikey";
const TOKEN_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, PartialEq)]
struct Claims<'a> {
    aud: &'static str,
    iss: &'a str,
    exp: i64,
    version: &'static str,
    iat: i64,
    email: &'a str,
}

impl<'a> Claims<'a> {
    fn from_payload(payload: &'a TokenPayload) -> Self {
        Self {
            aud: AUDIENCE,
            iss: &payload.iss,
            exp: payload.exp,
            version: TOKEN_VERSION,
            iat: payload.iat,
            email: &payload.email,
        }
    }
}

/// Signs the API key claims with the user's RSA private key (RS256).
///
/// The claims carry a fixed expiry from the settings file, so the token only
/// needs to be built once per client.
pub fn sign_token(payload: &TokenPayload, private_key_pem: &[u8]) -> Result<String, ApiError> {
    let key = EncodingKey::from_rsa_pem(private_key_pem).map_err(ApiError::TokenSigning)?;
    encode(
        &Header::new(Algorithm::RS256),
        &Claims::from_payload(payload),
        &key,
    )
    .map_err(ApiError::TokenSigning)
}
