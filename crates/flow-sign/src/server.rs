//! HTTP surface for the signer

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::sign::sign_params;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("{0} must be set")]
    MissingEnv(&'static str),

    #[error("invalid PORT '{0}'")]
    InvalidPort(String),

    #[error("request body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl IntoResponse for SignError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

#[derive(Clone)]
pub struct SignerConfig {
    pub api_key: String,
    pub api_secret: String,
    pub port: u16,
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

impl SignerConfig {
    /// Read `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` and `PORT`
    pub fn from_env() -> Result<Self, SignError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SignError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(SignError::MissingEnv(name))
        };

        let api_key = required("CLOUDINARY_API_KEY")?;
        let api_secret = required("CLOUDINARY_API_SECRET")?;
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse().map_err(|_| SignError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            api_secret,
            port,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SignResponse {
    pub signature: String,
    pub api_key: String,
    pub timestamp: Value,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(config: SignerConfig) -> Router {
    Router::new()
        .route("/sign", post(sign_upload))
        .with_state(Arc::new(config))
}

async fn sign_upload(
    State(config): State<Arc<SignerConfig>>,
    body: Bytes,
) -> Result<Json<SignResponse>, SignError> {
    let params = parse_params(&body)?;
    let signature = sign_params(&params, &config.api_secret);
    log::debug!("Signed upload parameters: {:?}", params.keys().collect::<Vec<_>>());

    Ok(Json(SignResponse {
        signature,
        api_key: config.api_key.clone(),
        timestamp: params.get("timestamp").cloned().unwrap_or(Value::Null),
    }))
}

/// An empty body or a JSON value that is not an object signs no parameters.
fn parse_params(body: &[u8]) -> Result<Map<String, Value>, SignError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use sha1::{Digest, Sha1};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn config() -> SignerConfig {
        SignerConfig {
            api_key: "key-123".to_string(),
            api_secret: "secret".to_string(),
            port: DEFAULT_PORT,
        }
    }

    async fn post_sign(body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/sign")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = router(config()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_sign_returns_signature_and_key() {
        let (status, body) = post_sign(r#"{"timestamp": 1700000000, "folder": "flow_sounds"}"#).await;
        assert_eq!(status, StatusCode::OK);

        let expected = hex::encode(Sha1::digest(
            b"folder=flow_sounds&timestamp=1700000000secret",
        ));
        assert_eq!(
            body,
            json!({"signature": expected, "api_key": "key-123", "timestamp": 1_700_000_000})
        );
    }

    #[tokio::test]
    async fn test_missing_timestamp_is_null() {
        let (status, body) = post_sign(r#"{"folder": "flow_sounds"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timestamp"], Value::Null);
    }

    #[tokio::test]
    async fn test_empty_body_signs_secret_only() {
        let (status, body) = post_sign("").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signature"], json!(hex::encode(Sha1::digest(b"secret"))));
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let (status, body) = post_sign("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not valid JSON"));
    }

    #[test]
    fn test_config_requires_credentials() {
        let env: HashMap<&str, &str> = HashMap::from([("CLOUDINARY_API_KEY", "k")]);
        let err = SignerConfig::from_lookup(|name| env.get(name).map(ToString::to_string)).unwrap_err();
        assert!(matches!(err, SignError::MissingEnv("CLOUDINARY_API_SECRET")));
    }

    #[test]
    fn test_config_port_default_and_override() {
        let mut env: HashMap<&str, &str> =
            HashMap::from([("CLOUDINARY_API_KEY", "k"), ("CLOUDINARY_API_SECRET", "s")]);
        let cfg = SignerConfig::from_lookup(|name| env.get(name).map(ToString::to_string)).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);

        env.insert("PORT", "8080");
        let cfg = SignerConfig::from_lookup(|name| env.get(name).map(ToString::to_string)).unwrap();
        assert_eq!(cfg.port, 8080);

        env.insert("PORT", "eighty");
        assert!(SignerConfig::from_lookup(|name| env.get(name).map(ToString::to_string)).is_err());
    }
}
