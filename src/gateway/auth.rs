//! Service account authorization
//!
//! Signs an RS256 JWT with the service account's private key and exchanges
//! it for a short lived bearer token.

use crate::error::{Result, SheetError};
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Read/write access to spreadsheets
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Google OAuth token endpoint
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

/// Bearer token returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Service account identity: email plus PEM private key
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    email: String,
    private_key: String,
    token_uri: String,
    scope: String,
}

impl ServiceAccount {
    pub fn new(email: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            private_key: private_key.into(),
            token_uri: TOKEN_URI.to_string(),
            scope: SPREADSHEETS_SCOPE.to_string(),
        }
    }

    /// Use another token endpoint (the JWT audience follows it)
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Build the signed JWT assertion valid for one hour from `now`.
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = JwtClaims {
            iss: &self.email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let key_pair = self.key_pair()?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| SheetError::Credentials("failed to sign token request".to_string()))?;

        Ok(format!(
            "{}.{}",
            signing_input,
            BASE64_URL_SAFE_NO_PAD.encode(&signature)
        ))
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn fetch_access_token(&self, http: &reqwest::Client) -> Result<AccessToken> {
        let jwt = self.signed_assertion(Utc::now())?;
        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];

        debug!(email = %self.email, token_uri = %self.token_uri, "requesting access token");
        let response = http.post(&self.token_uri).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Auth {
                status: status.as_u16(),
                message: super::google::error_body(response.text().await),
            });
        }

        Ok(response.json::<AccessToken>().await?)
    }

    fn key_pair(&self) -> Result<RsaKeyPair> {
        let mut reader = std::io::Cursor::new(self.private_key.as_bytes());
        let item = rustls_pemfile::read_one(&mut reader)
            .map_err(|e| SheetError::Credentials(format!("invalid PEM private key: {}", e)))?;

        match item {
            Some(rustls_pemfile::Item::Pkcs8Key(der)) => {
                RsaKeyPair::from_pkcs8(der.secret_pkcs8_der()).map_err(|e| {
                    SheetError::Credentials(format!("rejected pkcs8 key: {}", e))
                })
            }
            Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(
                der.secret_pkcs1_der(),
            )
            .map_err(|e| SheetError::Credentials(format!("rejected pkcs1 key: {}", e))),
            _ => Err(SheetError::Credentials(
                "no RSA private key found in PEM data".to_string(),
            )),
        }
    }
}
