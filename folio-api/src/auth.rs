//! Authentication Module
//!
//! Single-administrator authentication for the Folio API:
//! 1. Credential verification against a stored Argon2 hash
//! 2. HMAC-signed JWT issuance and verification
//!
//! Token time validation uses an injected clock instead of the library's
//! own, so tests stay deterministic.

use crate::error::{ApiError, ApiResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token lifetime: 72 hours.
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 72 * 60 * 60;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for JWT time validation.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    ///
    /// Returns negative values for pre-1970 times, which are treated as a
    /// server misconfiguration.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Test clock helpers for common scenarios.
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC, past any token minted by [`valid`]
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret. Empty secrets fall back to the insecure default,
    /// which production validation rejects.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Self(SecretString::from(INSECURE_DEFAULT_SECRET));
        }
        Self(SecretString::from(secret))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// Email the administrator logs in with
    pub admin_email: String,

    /// PHC-format Argon2 hash of the administrator password
    pub admin_password_hash: SecretString,

    /// Subject written into issued tokens
    pub admin_id: String,

    /// JWT token expiration in seconds (default: 72 hours)
    pub jwt_expiration_secs: i64,

    /// Leeway applied to `exp` checks in seconds (default: 0)
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("admin_email", &self.admin_email)
            .field("admin_password_hash", &"[REDACTED]")
            .field("admin_id", &self.admin_id)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::new(INSECURE_DEFAULT_SECRET),
            admin_email: String::new(),
            admin_password_hash: SecretString::from(String::new()),
            admin_id: "1".to_string(),
            jwt_expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            jwt_clock_skew_secs: 0,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Build a config for a known administrator identity.
    pub fn new(
        jwt_secret: impl Into<String>,
        admin_email: impl Into<String>,
        admin_password_hash: impl Into<String>,
        admin_id: impl Into<String>,
    ) -> Self {
        Self {
            jwt_secret: JwtSecret::new(jwt_secret),
            admin_email: admin_email.into(),
            admin_password_hash: SecretString::from(admin_password_hash.into()),
            admin_id: admin_id.into(),
            ..Self::default()
        }
    }

    /// Replace the clock used for issuing and validating tokens.
    pub fn with_clock(mut self, clock: Arc<dyn JwtClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: JWT signing secret
    /// - `ADMIN_EMAIL`: administrator login email
    /// - `ADMIN_PASSWORD_HASH`: PHC-format Argon2 hash of the admin password
    /// - `ADMIN_ID`: token subject (default: "1")
    /// - `FOLIO_JWT_LEEWAY_SECS`: expiry leeway (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            jwt_secret: JwtSecret::new(std::env::var("JWT_SECRET").unwrap_or_default()),
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_default(),
            admin_password_hash: SecretString::from(
                std::env::var("ADMIN_PASSWORD_HASH").unwrap_or_default(),
            ),
            admin_id: std::env::var("ADMIN_ID")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.admin_id),
            jwt_clock_skew_secs: std::env::var("FOLIO_JWT_LEEWAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_clock_skew_secs),
            ..defaults
        }
    }

    /// Validate the authentication configuration for production use.
    ///
    /// In production, insecure or incomplete settings abort startup. In
    /// development they are logged as warnings.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("FOLIO_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        let is_production = environment == "production" || environment == "prod";

        let mut problems = Vec::new();
        if self.jwt_secret.is_insecure_default() {
            problems.push("JWT_SECRET is not set".to_string());
        } else if self.jwt_secret.len() < 32 {
            problems.push(format!(
                "JWT_SECRET is too short ({} chars, minimum 32)",
                self.jwt_secret.len()
            ));
        }
        if self.admin_email.trim().is_empty() {
            problems.push("ADMIN_EMAIL is not set".to_string());
        }
        if PasswordHash::new(self.admin_password_hash.expose_secret()).is_err() {
            problems.push("ADMIN_PASSWORD_HASH is not a valid Argon2 PHC string".to_string());
        }

        if problems.is_empty() {
            return Ok(());
        }

        if is_production {
            return Err(ApiError::internal_error(format!(
                "Refusing to start in production: {}. FOLIO_ENVIRONMENT={}",
                problems.join("; "),
                environment
            )));
        }

        for problem in &problems {
            tracing::warn!(problem = %problem, "Insecure authentication configuration");
        }
        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (administrator ID)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: subject,
            iat: now,
            exp: now + expiration_secs,
        }
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }
}

// ============================================================================
// TOKEN FUNCTIONS
// ============================================================================

/// HMAC algorithms accepted on verification. Anything else is rejected.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Validate `exp` with the given leeway. A token expires at `exp`, inclusive.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if now >= exp + leeway_secs {
        return Err(ApiError::token_expired());
    }
    Ok(())
}

/// Validate a JWT token and extract claims.
///
/// Signature and algorithm are checked by `jsonwebtoken`; time is checked
/// here against the configured clock.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT rejected");
        ApiError::invalid_token()
    })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();

    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error("Internal server error"));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Generate an HS256 token for `subject`.
pub fn generate_jwt_token(config: &AuthConfig, subject: String) -> ApiResult<String> {
    let claims = Claims::new(subject, config.jwt_expiration_secs, &*config.clock);
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(Algorithm::HS256);

    encode(&header, &claims, &encoding_key).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign token");
        ApiError::internal_error("Internal server error")
    })
}

// ============================================================================
// CREDENTIALS
// ============================================================================

fn verify_password(config: &AuthConfig, password: &str) -> bool {
    let parsed = match PasswordHash::new(config.admin_password_hash.expose_secret()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, "Stored admin password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Verify administrator credentials and issue a token.
///
/// Unknown email and wrong password produce the same error. The hash check
/// runs in both cases.
pub fn login(config: &AuthConfig, email: &str, password: &str) -> ApiResult<String> {
    let email_matches = !config.admin_email.is_empty() && email == config.admin_email;
    let password_matches = verify_password(config, password);

    if !(email_matches && password_matches) {
        tracing::info!("Rejected login attempt");
        return Err(ApiError::invalid_credentials());
    }

    generate_jwt_token(config, config.admin_id.clone())
}

/// Hash a password into a PHC string suitable for `ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))
}

// ============================================================================
// TESTS
// ============================================================================
