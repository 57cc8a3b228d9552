use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{CompletionClient, Error, Result};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// OpenAI-compatible chat completion client.
///
/// One request per call, no retries. The HTTP client carries the timeout so a
/// stalled connection is cut off even outside the generator's own deadline.
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let url = format!("{}{COMPLETIONS_PATH}", self.base_url);

        debug!(model = %self.model, "Posting chat completion");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Auth(format!("HTTP {status}: {body}")))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Err(Error::Timeout(self.timeout.as_secs()))
            }
            s if !s.is_success() => Err(Error::Completion(format!("HTTP {status}: {body}"))),
            _ => parse_completion(&body),
        }
    }
}

impl OpenAiClient {
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout.as_secs())
        } else {
            Error::Http(e.to_string())
        }
    }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Extract the first choice's message content from a completion body.
pub fn parse_completion(body: &str) -> Result<String> {
    let resp: ChatResponse = serde_json::from_str(body)?;
    resp.choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Malformed("completion has no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| Error::Malformed("completion message has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const COMPLETION_OK: &str =
        r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Go long."}}]}"#;

    /// Accept one connection, read the whole request, wait `stall`, then
    /// answer with `status_line` and `body`. The handle yields the request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
        stall: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let request = read_request(&mut sock).await;
            tokio::time::sleep(stall).await;
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = sock.write_all(reply.as_bytes()).await;
            request
        });
        (base_url, handle)
    }

    async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(base_url: String, timeout: Duration) -> OpenAiClient {
        OpenAiClient::new("sk-test", "gpt-3.5-turbo", base_url, timeout).unwrap()
    }

    #[tokio::test]
    async fn posts_prompt_with_bearer_key() {
        let (base_url, server) = serve_once("200 OK", COMPLETION_OK, Duration::ZERO).await;

        let text = client(base_url, Duration::from_secs(5)).complete("price?").await.unwrap();
        assert_eq!(text, "Go long.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""content":"price?""#));
    }

    #[tokio::test]
    async fn unauthorized_and_forbidden_map_to_auth() {
        for status_line in ["401 Unauthorized", "403 Forbidden"] {
            let (base_url, _server) =
                serve_once(status_line, r#"{"error":"invalid_api_key"}"#, Duration::ZERO).await;
            match client(base_url, Duration::from_secs(5)).complete("x").await {
                Err(Error::Auth(msg)) => assert!(msg.contains("invalid_api_key"), "{msg}"),
                other => panic!("{status_line}: expected auth error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn gateway_timeouts_map_to_timeout() {
        for status_line in ["408 Request Timeout", "504 Gateway Timeout"] {
            let (base_url, _server) = serve_once(status_line, "", Duration::ZERO).await;
            assert!(
                matches!(
                    client(base_url, Duration::from_secs(7)).complete("x").await,
                    Err(Error::Timeout(7))
                ),
                "{status_line}"
            );
        }
    }

    #[tokio::test]
    async fn other_http_failures_map_to_completion() {
        for status_line in ["429 Too Many Requests", "500 Internal Server Error"] {
            let (base_url, _server) = serve_once(status_line, "overloaded", Duration::ZERO).await;
            match client(base_url, Duration::from_secs(5)).complete("x").await {
                Err(Error::Completion(msg)) => assert!(msg.contains("overloaded"), "{msg}"),
                other => panic!("{status_line}: expected completion error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn stalled_server_hits_client_timeout() {
        let (base_url, server) = serve_once("200 OK", COMPLETION_OK, Duration::from_secs(5)).await;

        let result = client(base_url, Duration::from_secs(1)).complete("x").await;
        assert!(matches!(result, Err(Error::Timeout(1))), "{result:?}");
        server.abort();
    }

    #[test]
    fn request_is_single_user_message() {
        let req = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Go long."}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "Go short."}, "finish_reason": "stop"}
            ],
            "usage": {"total_tokens": 42}
        }"#;
        assert_eq!(parse_completion(body).unwrap(), "Go long.");
    }

    #[test]
    fn empty_choices_is_malformed() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(parse_completion("{}"), Err(Error::Malformed(_))));
    }

    #[test]
    fn null_content_is_malformed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(parse_completion(body), Err(Error::Malformed(_))));
    }

    #[test]
    fn garbage_is_json_error() {
        assert!(matches!(parse_completion("upstream error"), Err(Error::Json(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenAiClient::new(
            "sk-test",
            "gpt-3.5-turbo",
            "http://localhost:8080/",
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.model(), "gpt-3.5-turbo");
    }
}
