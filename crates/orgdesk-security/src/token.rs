//! Opaque bearer tokens.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use orgdesk_config::SecurityConfig;
use orgdesk_core::{AccessTokenId, Interface};
use sha2::{Digest, Sha256};
use shaku::Component;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A freshly generated secret together with the digest to store.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret {
    pub secret: String,
    pub digest: String,
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecret")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

/// A bearer value split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    /// Row id, when the value carried an `<id>|` prefix.
    pub id: Option<AccessTokenId>,
    pub secret: &'a str,
}

/// Interface for issuing and checking bearer tokens.
pub trait TokenServiceInterface: Interface + Send + Sync {
    /// Generates a random secret and its storage digest.
    fn generate(&self) -> TokenSecret;

    /// Builds the value handed to the client.
    fn plain_text(&self, id: AccessTokenId, secret: &str) -> String {
        format!("{id}|{secret}")
    }

    /// Expiry for a token issued at `now`, if tokens expire.
    fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Checks a presented secret against a stored digest.
    fn matches(&self, secret: &str, digest: &str) -> bool {
        constant_time_eq(digest_secret(secret).as_bytes(), digest.as_bytes())
    }
}

/// Token service backed by the OS random number generator.
#[derive(Debug, Clone, Component)]
#[shaku(interface = TokenServiceInterface)]
pub struct TokenService {
    token_length: usize,
    lifetime: Option<Duration>,
}

impl TokenService {
    pub const DEFAULT_LENGTH: usize = 40;

    #[must_use]
    pub fn new(token_length: usize, lifetime: Option<Duration>) -> Self {
        Self { token_length, lifetime }
    }

    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        let lifetime = config
            .token_expiration_minutes
            .and_then(|m| i64::try_from(m).ok())
            .and_then(Duration::try_minutes);
        Self::new(config.token_length, lifetime)
    }

    /// Returns the DI parameters for this service.
    #[must_use]
    pub fn into_parameters(self) -> TokenServiceParameters {
        TokenServiceParameters {
            token_length: self.token_length,
            lifetime: self.lifetime,
        }
    }
}

impl Default for TokenService {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LENGTH, None)
    }
}

impl TokenServiceInterface for TokenService {
    fn generate(&self) -> TokenSecret {
        let secret = random_alphanumeric(self.token_length);
        let digest = digest_secret(&secret);
        TokenSecret { secret, digest }
    }

    fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lifetime.map(|lifetime| now + lifetime)
    }
}

/// Splits a bearer value. A value without `|` is treated as a bare secret.
#[must_use]
pub fn parse_token(token: &str) -> Option<ParsedToken<'_>> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    match token.split_once('|') {
        Some((id, secret)) => {
            let id = id.parse::<AccessTokenId>().ok()?;
            (!secret.is_empty()).then_some(ParsedToken { id: Some(id), secret })
        }
        None => Some(ParsedToken { id: None, secret: token }),
    }
}

/// SHA-256 of a secret, hex-encoded.
#[must_use]
pub fn digest_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Random alphanumeric string drawn from the OS generator.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        // 6 bits per draw; values past the alphabet are rejected to avoid bias.
        let index = (OsRng.next_u32() & 0x3f) as usize;
        if let Some(&c) = ALPHABET.get(index) {
            out.push(char::from(c));
        }
    }
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let service = TokenService::default();
        let token = service.generate();

        assert_eq!(token.secret.len(), 40);
        assert!(token.secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(token.digest.len(), 64);
        assert!(service.matches(&token.secret, &token.digest));
        assert!(!service.matches("other", &token.digest));
        assert_ne!(service.generate().secret, token.secret);
    }

    #[test]
    fn test_plain_text_round_trips_through_parse() {
        let service = TokenService::default();
        let plain = service.plain_text(AccessTokenId(42), "abc");
        assert_eq!(plain, "42|abc");

        let parsed = parse_token(&plain).unwrap();
        assert_eq!(parsed.id, Some(AccessTokenId(42)));
        assert_eq!(parsed.secret, "abc");
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        assert!(parse_token("").is_none());
        assert!(parse_token("abc|def").is_none());
        assert!(parse_token("12|").is_none());
        assert_eq!(parse_token("bare").unwrap().id, None);
    }

    #[test]
    fn test_expiry_from_config() {
        let now = Utc::now();
        let never = TokenService::from_config(&SecurityConfig::default());
        assert!(never.expires_at(now).is_none());

        let config = SecurityConfig {
            token_expiration_minutes: Some(60),
            ..SecurityConfig::default()
        };
        let hourly = TokenService::from_config(&config);
        assert_eq!(hourly.expires_at(now), Some(now + Duration::minutes(60)));
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(
            digest_secret("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    shaku::module! {
        TokenModule {
            components = [TokenService],
            providers = []
        }
    }

    #[test]
    fn test_component_built_from_parameters() {
        use shaku::HasComponent;

        let service = TokenService::new(12, Some(Duration::minutes(5)));
        let module = TokenModule::builder()
            .with_component_parameters::<TokenService>(service.into_parameters())
            .build();
        let tokens: &dyn TokenServiceInterface = module.resolve_ref();

        let now = Utc::now();
        assert_eq!(tokens.generate().secret.len(), 12);
        assert_eq!(tokens.expires_at(now), Some(now + Duration::minutes(5)));
    }
}
