/// Bearer token issuing and validation
///
/// Tokens are RS256-signed JWTs. Each token carries a `jti` so the issuing
/// service can record it and revoke it individually (logout), and a `sub`
/// holding the public account identifier of the user it was issued to.
///
/// ## Usage
///
/// Keys must be installed once during startup:
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// jwt::initialize_jwt_keys(&private_key_pem, &public_key_pem)?;
/// let issued = jwt::generate_access_token("alice_01", chrono::Duration::days(1))?;
/// let data = jwt::validate_token(&issued.token)?;
/// assert_eq!(data.claims.sub, "alice_01");
/// ```
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Only RS256 is accepted; symmetric algorithms are rejected at decode time.
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account identifier (the user's `user_id`)
    pub sub: String,
    /// Token id, recorded server side at login
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: String,
}

impl Claims {
    /// Parse the `jti` claim back into a UUID
    pub fn token_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.jti).map_err(|e| anyhow!("Invalid token id in claims: {e}"))
    }
}

/// A freshly signed token together with the metadata the caller persists.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Install the RSA key pair used for signing and verification.
///
/// Can only succeed once per process.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

/// Whether `initialize_jwt_keys` has already run in this process
pub fn keys_initialized() -> bool {
    JWT_ENCODING_KEY.get().is_some() && JWT_DECODING_KEY.get().is_some()
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

/// Sign a new access token for `user_id` that expires after `ttl`.
pub fn generate_access_token(user_id: &str, ttl: Duration) -> Result<IssuedToken> {
    if ttl <= Duration::zero() {
        return Err(anyhow!("Token lifetime must be positive"));
    }

    let issued_at = Utc::now();
    let expires_at = issued_at + ttl;
    let jti = Uuid::new_v4();

    let claims = Claims {
        sub: user_id.to_string(),
        jti: jti.to_string(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
        token_type: ACCESS_TOKEN_TYPE.to_string(),
    };

    let encoding_key = get_encoding_key()?;
    let token = encode(&Header::new(JWT_ALGORITHM), &claims, encoding_key)
        .map_err(|e| anyhow!("Failed to generate access token: {e}"))?;

    Ok(IssuedToken {
        token,
        jti,
        issued_at,
        expires_at,
    })
}

/// Verify signature, expiry and token type, returning the decoded claims.
///
/// Expiry is checked without leeway.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(token, decoding_key, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))?;

    if data.claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(anyhow!(
            "Unexpected token type: {}",
            data.claims.token_type
        ));
    }

    Ok(data)
}
