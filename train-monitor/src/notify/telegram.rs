//! Telegram delivery of change notifications.
//!
//! One message is rendered per batch and posted to every configured chat
//! via the Bot API. A failed chat does not stop delivery to the rest, but
//! any failure makes the batch count as undelivered.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::{StationConfig, TrainChange};

use super::message::format_message;

/// Token value shipped in sample configs that means "no token yet".
pub const PLACEHOLDER_BOT_TOKEN: &str = "your_telegram_bot_token_here";

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Why a sink could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to construct HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Bot API client delivering rendered notifications.
pub struct TelegramSink {
    client: reqwest::Client,
    bot_token: String,
    base_url: String,
}

impl TelegramSink {
    pub fn new(bot_token: impl Into<String>) -> Result<Self, SinkError> {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        bot_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SinkError> {
        let bot_token = bot_token.into();
        if bot_token.is_empty() || bot_token == PLACEHOLDER_BOT_TOKEN {
            warn!("Telegram bot token not configured, deliveries will fail");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            bot_token,
            base_url: base_url.into(),
        })
    }

    /// Deliver one rendered message per configured target.
    ///
    /// Returns true only when every target accepted it. An empty change
    /// list needs no delivery and counts as success; an empty target list
    /// cannot deliver anything and counts as failure.
    pub async fn send(&self, changes: &[TrainChange], config: &StationConfig) -> bool {
        if changes.is_empty() {
            return true;
        }
        if config.notify_targets.is_empty() {
            error!(station = %config.crs, "no notification targets configured");
            return false;
        }

        let message = format_message(changes, config);
        let mut success = true;
        for chat_id in &config.notify_targets {
            success &= self
                .send_to_chat(chat_id, &message, config, changes.len())
                .await;
        }
        success
    }

    async fn send_to_chat(
        &self,
        chat_id: &str,
        text: &str,
        config: &StationConfig,
        change_count: usize,
    ) -> bool {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        match self.client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(
                    %chat_id,
                    station = %config.crs,
                    changes = change_count,
                    "notification delivered"
                );
                true
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                error!(%chat_id, status, body, "Telegram rejected notification");
                false
            }
            Err(error) => {
                error!(%chat_id, %error, "failed to send Telegram notification");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darwin::mock;
    use crate::domain::{ChangeType, Crs, Severity};
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config_with_targets(targets: &[&str]) -> StationConfig {
        let mut config = StationConfig::new(Crs::parse("ELY").unwrap(), "Ely");
        config.notify_targets = targets.iter().map(ToString::to_string).collect();
        config
    }

    fn delay_change() -> TrainChange {
        let mut service = mock::service("a");
        service.delay_minutes = 12;
        TrainChange {
            change_type: ChangeType::Delay,
            service_id: service.service_id.clone(),
            service,
            old_value: "On time".to_string(),
            new_value: "12 minutes".to_string(),
            severity: Severity::Low,
            detected_at: Utc::now(),
            message: "Train delayed by 12 minutes".to_string(),
        }
    }

    fn headers_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    async fn read_http_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = headers_end(&buf) {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    async fn respond(socket: &mut TcpStream, status: &str) {
        let response =
            format!("HTTP/1.1 {status}\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{{}}");
        socket.write_all(response.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn empty_changes_need_no_delivery() {
        let sink = TelegramSink::with_base_url("token", "http://127.0.0.1:1").unwrap();

        assert!(sink.send(&[], &config_with_targets(&["123"])).await);
    }

    #[tokio::test]
    async fn missing_targets_count_as_failure() {
        let sink = TelegramSink::with_base_url("token", "http://127.0.0.1:1").unwrap();

        assert!(!sink.send(&[delay_change()], &config_with_targets(&[])).await);
    }

    #[tokio::test]
    async fn unreachable_api_counts_as_failure() {
        let sink = TelegramSink::with_base_url("token", "http://127.0.0.1:1").unwrap();

        assert!(
            !sink
                .send(&[delay_change()], &config_with_targets(&["123"]))
                .await
        );
    }

    #[tokio::test]
    async fn delivers_to_every_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut requests = Vec::new();
            for _ in 0..2 {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_http_request(&mut socket).await);
                respond(&mut socket, "200 OK").await;
            }
            requests
        });

        let sink = TelegramSink::with_base_url("token", format!("http://{addr}")).unwrap();
        let delivered = sink
            .send(&[delay_change()], &config_with_targets(&["111", "222"]))
            .await;

        assert!(delivered);
        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /bottoken/sendMessage"));
        assert!(requests[0].contains("\"chat_id\":\"111\""));
        assert!(requests[1].contains("\"chat_id\":\"222\""));
        assert!(requests[0].contains("Changes at Ely"));
        assert!(requests[0].contains("\"parse_mode\":\"Markdown\""));
    }

    #[tokio::test]
    async fn partial_failure_reports_false_but_continues() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut served = 0;
            for status in ["500 Internal Server Error", "200 OK"] {
                let (mut socket, _) = listener.accept().await.unwrap();
                let _ = read_http_request(&mut socket).await;
                respond(&mut socket, status).await;
                served += 1;
            }
            served
        });

        let sink = TelegramSink::with_base_url("token", format!("http://{addr}")).unwrap();
        let delivered = sink
            .send(&[delay_change()], &config_with_targets(&["111", "222"]))
            .await;

        assert!(!delivered);
        // The second target was still attempted
        assert_eq!(server.await.unwrap(), 2);
    }
}
