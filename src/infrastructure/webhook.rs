// Webhook - Signature verification and event model for identity-provider webhooks
//
// Deliveries are signed Svix-style: HMAC-SHA256 over "{id}.{timestamp}.{body}"
// keyed with the base64 part of a `whsec_` secret. The signature header carries
// one or more space-separated `v1,<base64>` entries.

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::core::validation::truncate_display_name;
use crate::error::{AppError, AppResult};
use crate::models::ProfileSeed;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const TOLERANCE_SECS: u64 = 5 * 60;
const FALLBACK_DISPLAY_NAME: &str = "名無し";

/// The three delivery headers every webhook request must carry
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    pub fn from_headers(headers: &HeaderMap) -> AppResult<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        };

        match (get("svix-id"), get("svix-timestamp"), get("svix-signature")) {
            (Some(id), Some(timestamp), Some(signature)) => Ok(Self {
                id,
                timestamp,
                signature,
            }),
            _ => Err(AppError::BadRequest("Missing svix headers".to_string())),
        }
    }
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> AppResult<Self> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD.decode(encoded).map_err(|e| {
            AppError::ConfigurationError(format!("Invalid CLERK_WEBHOOK_SECRET: {}", e))
        })?;
        Ok(Self { key })
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("Failed to key webhook HMAC: {}", e)))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// `v1,<base64>` signature for a delivery
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> AppResult<String> {
        let tag = self.mac(id, timestamp, body)?.finalize().into_bytes();
        Ok(format!("v1,{}", STANDARD.encode(tag)))
    }

    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8], now: DateTime<Utc>) -> AppResult<()> {
        let sent_at: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid svix-timestamp header".to_string()))?;
        if now.timestamp().abs_diff(sent_at) > TOLERANCE_SECS {
            return Err(AppError::BadRequest("Webhook timestamp outside tolerance".to_string()));
        }

        let expected = self.mac(&headers.id, &headers.timestamp, body)?;
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|encoded| STANDARD.decode(encoded).ok())
            .any(|candidate| expected.clone().verify_slice(&candidate).is_ok());

        if matched {
            Ok(())
        } else {
            Err(AppError::BadRequest("Invalid webhook signature".to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// User object as sent in `user.created` / `user.updated`
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProviderUser {
    /// Display name seed: username, then full name, then a fixed placeholder
    pub fn profile_seed(&self) -> ProfileSeed {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let name = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| (!full_name.is_empty()).then_some(full_name))
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());

        ProfileSeed {
            clerk_id: self.id.clone(),
            display_name: truncate_display_name(&name),
            avatar_url: self.image_url.clone().filter(|url| !url.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletedObject {
    pub id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ProviderEvent {
    UserCreated(ProviderUser),
    UserUpdated(ProviderUser),
    UserDeleted(DeletedObject),
    Other(String),
}

impl ProviderEvent {
    pub fn parse(body: &[u8]) -> AppResult<Self> {
        let raw: RawEvent = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

        let data = |kind: &str| AppError::BadRequest(format!("Invalid {} payload", kind));
        Ok(match raw.event_type.as_str() {
            "user.created" => ProviderEvent::UserCreated(
                serde_json::from_value(raw.data).map_err(|_| data("user.created"))?,
            ),
            "user.updated" => ProviderEvent::UserUpdated(
                serde_json::from_value(raw.data).map_err(|_| data("user.updated"))?,
            ),
            "user.deleted" => ProviderEvent::UserDeleted(
                serde_json::from_value(raw.data).map_err(|_| data("user.deleted"))?,
            ),
            _ => ProviderEvent::Other(raw.event_type),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

    fn headers_for(verifier: &WebhookVerifier, body: &[u8], at: i64) -> WebhookHeaders {
        let timestamp = at.to_string();
        WebhookHeaders {
            id: "msg_1".to_string(),
            signature: verifier.sign("msg_1", &timestamp, body).unwrap(),
            timestamp,
        }
    }

    #[test]
    fn test_accepts_valid_signature() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = Utc::now();
        let body = br#"{"type":"user.created"}"#;
        let headers = headers_for(&verifier, body, now.timestamp());
        assert!(verifier.verify(&headers, body, now).is_ok());
    }

    #[test]
    fn test_accepts_any_matching_signature_entry() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = Utc::now();
        let body = b"{}";
        let mut headers = headers_for(&verifier, body, now.timestamp());
        headers.signature = format!("v1,AAAA {}", headers.signature);
        assert!(verifier.verify(&headers, body, now).is_ok());
    }

    #[test]
    fn test_rejects_tampered_body_and_stale_timestamp() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = Utc::now();
        let headers = headers_for(&verifier, b"original", now.timestamp());
        assert!(matches!(
            verifier.verify(&headers, b"tampered", now),
            Err(AppError::BadRequest(_))
        ));

        let stale = headers_for(&verifier, b"original", now.timestamp() - 600);
        assert!(verifier.verify(&stale, b"original", now).is_err());
    }

    #[test]
    fn test_extreme_timestamps_are_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = Utc::now();
        for at in [i64::MIN, i64::MAX, 0] {
            let headers = headers_for(&verifier, b"{}", at);
            assert!(matches!(
                verifier.verify(&headers, b"{}", now),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_missing_headers_are_bad_requests() {
        let mut headers = HeaderMap::new();
        headers.insert("svix-id", HeaderValue::from_static("msg_1"));
        assert!(matches!(
            WebhookHeaders::from_headers(&headers),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_invalid_secret_is_configuration_error() {
        assert!(matches!(
            WebhookVerifier::new("whsec_!!!"),
            Err(AppError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_parse_events() {
        let created = json!({
            "type": "user.created",
            "data": { "id": "user_1", "username": "alice", "image_url": "https://img/a.png" }
        });
        match ProviderEvent::parse(created.to_string().as_bytes()).unwrap() {
            ProviderEvent::UserCreated(user) => {
                let seed = user.profile_seed();
                assert_eq!(seed.clerk_id, "user_1");
                assert_eq!(seed.display_name, "alice");
                assert_eq!(seed.avatar_url.as_deref(), Some("https://img/a.png"));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let deleted = json!({ "type": "user.deleted", "data": { "id": "user_1", "deleted": true } });
        assert!(matches!(
            ProviderEvent::parse(deleted.to_string().as_bytes()).unwrap(),
            ProviderEvent::UserDeleted(DeletedObject { id: Some(_) })
        ));

        let session = json!({ "type": "session.created", "data": {} });
        assert!(matches!(
            ProviderEvent::parse(session.to_string().as_bytes()).unwrap(),
            ProviderEvent::Other(kind) if kind == "session.created"
        ));

        assert!(ProviderEvent::parse(b"not json").is_err());
    }

    #[test]
    fn test_profile_seed_fallbacks() {
        let user = ProviderUser {
            id: "user_2".to_string(),
            username: None,
            first_name: Some("Taro".to_string()),
            last_name: Some("Yamada".to_string()),
            image_url: Some(String::new()),
        };
        let seed = user.profile_seed();
        assert_eq!(seed.display_name, "Taro Yamada");
        assert_eq!(seed.avatar_url, None);

        let anonymous = ProviderUser {
            id: "user_3".to_string(),
            username: Some("  ".to_string()),
            first_name: None,
            last_name: None,
            image_url: None,
        };
        assert_eq!(anonymous.profile_seed().display_name, "名無し");

        let long = ProviderUser {
            username: Some("x".repeat(50)),
            ..anonymous
        };
        assert_eq!(long.profile_seed().display_name.chars().count(), 30);
    }
}
