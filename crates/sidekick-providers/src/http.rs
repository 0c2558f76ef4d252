//! JSON-over-HTTP AI service.
//!
//! Every action goes to a single endpoint as `POST {base_url}` with an
//! `AiRequest` body; the reply is an `AiReply`. Requests are bounded by the
//! configured timeout and never retried.

use async_trait::async_trait;
use sidekick_core::{
    config::AiConfig,
    error::SidekickError,
    service::{AiReply, AiRequest},
    traits::AiService,
};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// AI service reached over HTTP.
pub struct HttpAiService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl HttpAiService {
    /// Create from config values.
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl HttpAiService {
    fn transport_error(&self, context: &str, e: reqwest::Error) -> SidekickError {
        if e.is_timeout() {
            SidekickError::Timeout(self.timeout_secs)
        } else {
            SidekickError::Ai(format!("{context}: {e}"))
        }
    }
}

/// Turn a non-success body into the message shown to the user.
///
/// Prefers the service's own `error` field when the body is JSON.
fn error_text(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<AiReply>(body) {
        Ok(AiReply {
            error: Some(message),
            ..
        }) if !message.trim().is_empty() => message,
        _ => format!("service returned {status}"),
    }
}

#[async_trait]
impl AiService for HttpAiService {
    fn name(&self) -> &str {
        "http"
    }

    async fn request(&self, request: &AiRequest) -> Result<AiReply, SidekickError> {
        let started = Instant::now();
        debug!("ai: POST {} action={}", self.base_url, request.action.as_str());

        let mut builder = self
            .client
            .post(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| self.transport_error("request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("ai: {} returned {status}", request.action.as_str());
            return Err(SidekickError::Ai(error_text(status, &body)));
        }

        // The request timeout also covers reading the body.
        let reply: AiReply = resp
            .json()
            .await
            .map_err(|e| self.transport_error("malformed reply", e))?;

        if let Some(message) = reply.error.as_deref().filter(|m| !m.trim().is_empty()) {
            return Err(SidekickError::Ai(message.to_string()));
        }

        debug!(
            "ai: {} answered in {}ms",
            request.action.as_str(),
            started.elapsed().as_millis()
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::service::AiAction;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve one canned HTTP response, optionally holding the socket open afterwards.
    async fn serve_once(response: &'static str, hold: bool) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = sock.read(&mut buf).await;
            sock.write_all(response.as_bytes()).await.unwrap();
            if hold {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
        });
        format!("http://{addr}/ai")
    }

    fn service(base_url: String) -> HttpAiService {
        HttpAiService::from_config(&AiConfig {
            base_url,
            timeout_secs: 1,
            ..Default::default()
        })
    }

    #[test]
    fn test_from_config() {
        let cfg = AiConfig {
            timeout_secs: 7,
            ..Default::default()
        };
        let svc = HttpAiService::from_config(&cfg);
        assert_eq!(svc.name(), "http");
        assert_eq!(svc.timeout_secs, 7);
        assert_eq!(svc.base_url, cfg.base_url);
    }

    #[test]
    fn test_error_text_uses_service_message() {
        let text = error_text(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":"prompt too long"}"#,
        );
        assert_eq!(text, "prompt too long");
    }

    #[test]
    fn test_error_text_falls_back_to_status() {
        let text = error_text(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(text.contains("502"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_error() {
        let cfg = AiConfig {
            base_url: "http://127.0.0.1:9/ai".into(),
            timeout_secs: 2,
            ..Default::default()
        };
        let svc = HttpAiService::from_config(&cfg);
        let req = AiRequest::prompt(sidekick_core::service::AiAction::Chat, "hi");
        assert!(svc.request(&req).await.is_err());
    }

    #[tokio::test]
    async fn test_reply_is_decoded() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 18\r\nConnection: close\r\n\r\n{\"response\":\"hey\"}",
            false,
        )
        .await;
        let reply = service(url)
            .request(&AiRequest::prompt(AiAction::Chat, "hi"))
            .await
            .unwrap();
        assert_eq!(reply.text(), Some("hey"));
    }

    #[tokio::test]
    async fn test_stalled_body_is_timeout() {
        // Headers arrive, the promised body never does.
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"resp",
            true,
        )
        .await;
        let err = service(url)
            .request(&AiRequest::prompt(AiAction::Chat, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, SidekickError::Timeout(1)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_error_field_in_success_reply_is_error() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 16\r\nConnection: close\r\n\r\n{\"error\":\"busy\"}",
            false,
        )
        .await;
        let err = service(url)
            .request(&AiRequest::prompt(AiAction::Chat, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, SidekickError::Ai(ref m) if m == "busy"));
    }
}
