// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs signed by the `securetoken` service account. Public
//! keys are fetched as a JWKS document and cached for the `max-age` the
//! endpoint advertises.

use super::identity::{IdentityError, VerifiedIdentity};
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
const MAX_SUBJECT_LEN: usize = 128;

#[derive(Clone)]
enum KeySource {
    Jwks { url: String },
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for ID tokens issued to one project.
pub struct IdTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    issuer: String,
    keys: KeySource,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl IdTokenVerifier {
    /// Create a production verifier that fetches and caches Google's keys.
    pub fn new(project_id: &str) -> anyhow::Result<Self> {
        Self::build(
            project_id,
            KeySource::Jwks {
                url: JWKS_URL.to_string(),
            },
        )
    }

    /// Create a verifier with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        project_id: &str,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key id must not be empty");
        }

        Self::build(
            project_id,
            KeySource::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn build(project_id: &str, keys: KeySource) -> anyhow::Result<Self> {
        if project_id.trim().is_empty() {
            anyhow::bail!("project id must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building ID token HTTP client")?;

        Ok(Self {
            http_client,
            project_id: project_id.to_string(),
            issuer: format!("{ISSUER_PREFIX}{project_id}"),
            keys,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a token and return its identity claims.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header = decode_header(token)
            .map_err(|e| IdentityError::InvalidToken(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| IdentityError::InvalidToken(format!("JWT validation failed: {e}")))?
            .claims;

        if claims.sub.is_empty() || claims.sub.len() > MAX_SUBJECT_LEN {
            return Err(IdentityError::InvalidToken(
                "sub claim must be 1-128 characters".to_string(),
            ));
        }

        not_in_future("iat", claims.iat)?;
        if let Some(auth_time) = claims.auth_time {
            not_in_future("auth_time", Some(auth_time))?;
        }

        tracing::debug!(uid = %claims.sub, "ID token verified");

        Ok(VerifiedIdentity {
            uid: claims.sub,
            name: claims.name,
            email: claims.email,
            picture: claims.picture,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, IdentityError> {
        let url = match &self.keys {
            KeySource::StaticKey {
                kid: static_kid,
                decoding_key,
            } => {
                if kid == static_kid {
                    return Ok(decoding_key.clone());
                }
                return Err(IdentityError::InvalidToken(format!(
                    "unknown JWT kid for static verifier: {kid}"
                )));
            }
            KeySource::Jwks { url } => url.as_str(),
        };

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // A kid we have never seen may mean Google rotated keys early.
        for force_refresh in [false, true] {
            self.refresh_jwks(url, force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(IdentityError::InvalidToken(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, url: &str, force_refresh: bool) -> Result<(), IdentityError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = %url, "Refreshing ID token signing keys");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IdentityError::Transport(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(IdentityError::Transport(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "ID token signing keys refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

fn not_in_future(claim: &str, value: Option<u64>) -> Result<(), IdentityError> {
    let Some(value) = value else {
        return Err(IdentityError::InvalidToken(format!("missing {claim} claim")));
    };

    if value > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(IdentityError::InvalidToken(format!(
            "{claim} claim is in the future"
        )));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const PROJECT: &str = "travel-auth-test";
    const KID: &str = "test-kid";
    const PRIVATE_PEM: &[u8] = include_bytes!("../../tests/fixtures/test_rsa_private_pkcs8.pem");
    const PUBLIC_PEM: &[u8] = include_bytes!("../../tests/fixtures/test_rsa_public.pem");

    fn verifier() -> IdTokenVerifier {
        let key = DecodingKey::from_rsa_pem(PUBLIC_PEM).unwrap();
        IdTokenVerifier::new_with_static_key(PROJECT, KID, key).unwrap()
    }

    fn sign(claims: serde_json::Value, kid: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        encode(
            &header,
            &claims,
            &EncodingKey::from_rsa_pem(PRIVATE_PEM).unwrap(),
        )
        .unwrap()
    }

    fn claims(now: u64) -> serde_json::Value {
        json!({
            "iss": format!("https://securetoken.google.com/{PROJECT}"),
            "aud": PROJECT,
            "sub": "google-subject-1",
            "iat": now,
            "auth_time": now,
            "exp": now + 3600,
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "picture": "https://example.com/grace.png"
        })
    }

    #[tokio::test]
    async fn verify_valid_token() {
        let token = sign(claims(now_unix_secs()), Some(KID));
        let identity = verifier().verify(&token).await.unwrap();

        assert_eq!(identity.uid, "google-subject-1");
        assert_eq!(identity.name.as_deref(), Some("Grace Hopper"));
        assert_eq!(identity.email.as_deref(), Some("grace@example.com"));
        assert_eq!(
            identity.picture.as_deref(),
            Some("https://example.com/grace.png")
        );
    }

    #[tokio::test]
    async fn verify_rejects_wrong_audience() {
        let mut c = claims(now_unix_secs());
        c["aud"] = json!("some-other-project");
        let token = sign(c, Some(KID));

        assert!(matches!(
            verifier().verify(&token).await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let now = now_unix_secs();
        let mut c = claims(now - 7200);
        c["exp"] = json!(now - 3600);
        let token = sign(c, Some(KID));

        assert!(matches!(
            verifier().verify(&token).await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn verify_rejects_unknown_kid_and_missing_kid() {
        let v = verifier();
        let unknown = sign(claims(now_unix_secs()), Some("other-kid"));
        let missing = sign(claims(now_unix_secs()), None);

        assert!(matches!(
            v.verify(&unknown).await,
            Err(IdentityError::InvalidToken(_))
        ));
        assert!(matches!(
            v.verify(&missing).await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn verify_rejects_hmac_token() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KID.to_string());
        let token = encode(
            &header,
            &claims(now_unix_secs()),
            &EncodingKey::from_secret(b"not-a-google-key"),
        )
        .unwrap();

        assert!(matches!(
            verifier().verify(&token).await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn verify_rejects_future_iat() {
        let now = now_unix_secs();
        let mut c = claims(now);
        c["iat"] = json!(now + 3600);
        let token = sign(c, Some(KID));

        assert!(matches!(
            verifier().verify(&token).await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        assert!(matches!(
            verifier().verify("not.a.jwt").await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=19842, must-revalidate"),
            Some(19842)
        );
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
    }

    #[test]
    fn parse_cache_control_max_age_invalid() {
        assert_eq!(parse_cache_control_max_age("no-cache"), None);
        assert_eq!(parse_cache_control_max_age("max-age=soon"), None);
        assert_eq!(parse_cache_control_max_age(""), None);
    }

    #[test]
    fn usable_keys_filters_non_signing_keys() {
        let jwks: Jwks = serde_json::from_value(json!({
            "keys": [
                { "kid": "enc", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" },
                { "kid": "ec", "kty": "EC", "n": "AQAB", "e": "AQAB" },
                { "kid": "", "kty": "RSA", "n": "AQAB", "e": "AQAB" },
                { "kid": "ok", "kty": "RSA", "alg": "RS256", "use": "sig", "n": "AQAB", "e": "AQAB" }
            ]
        }))
        .unwrap();

        let keys = usable_keys(jwks);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains_key("ok"));
    }

    #[test]
    fn static_key_requires_kid() {
        let key = DecodingKey::from_rsa_pem(PUBLIC_PEM).unwrap();
        assert!(IdTokenVerifier::new_with_static_key(PROJECT, " ", key).is_err());
    }
}
