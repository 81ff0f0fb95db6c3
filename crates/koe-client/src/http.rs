// reqwest-backed `CommentService` speaking the comment store's JSON API.

use std::time::Duration;

use async_trait::async_trait;
use koe_core::comment::{Comment, CommentId, VisibilityFilter};
use koe_core::config::ServiceConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ServiceError;
use crate::service::{CommentService, NewComment};

const OP_EXTRACT: &str = "extract";
const OP_LIST: &str = "list comments";
const OP_CREATE: &str = "create comment";
const OP_VISIBILITY: &str = "set visibility";
const OP_HEALTH: &str = "health check";

#[derive(Serialize)]
struct ExtractRequest<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct VisibilityRequest {
    is_public: bool,
}

/// HTTP client for the extraction service and comment store, which share a
/// base URL.
pub struct HttpCommentService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCommentService {
    /// Build a client whose every request is bounded by `request_timeout`.
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ServiceError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        Self::new(
            &config.base_url,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `request` and return the response body of a 2xx response.
    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| classify(operation, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify(operation, &e))?;
        debug!(operation, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl CommentService for HttpCommentService {
    async fn extract(&self, content: &str) -> Result<Vec<String>, ServiceError> {
        let request = self
            .http
            .post(self.url("/extract"))
            .json(&ExtractRequest { content });
        let body = self.send(OP_EXTRACT, request).await?;
        decode(OP_EXTRACT, &body)
    }

    async fn list_comments(&self, filter: VisibilityFilter) -> Result<Vec<Comment>, ServiceError> {
        let request = self
            .http
            .get(self.url("/api/comments"))
            .query(&[("show_private", filter.show_private())]);
        let body = self.send(OP_LIST, request).await?;
        decode(OP_LIST, &body)
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<(), ServiceError> {
        let request = self.http.post(self.url("/api/comments")).json(comment);
        // The store echoes the created comment; nothing here depends on it.
        self.send(OP_CREATE, request).await.map(|_| ())
    }

    async fn set_visibility(&self, id: CommentId, is_public: bool) -> Result<(), ServiceError> {
        // The flag travels both as a query parameter and in the body; stores
        // differ in which one they bind.
        let request = self
            .http
            .patch(self.url(&format!("/api/comments/{id}/visibility")))
            .query(&[("is_public", is_public)])
            .json(&VisibilityRequest { is_public });
        self.send(OP_VISIBILITY, request).await.map(|_| ())
    }

    async fn health(&self) -> Result<(), ServiceError> {
        let request = self.http.get(self.url("/healthz"));
        self.send(OP_HEALTH, request).await.map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn classify(operation: &'static str, err: &reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout { operation }
    } else {
        ServiceError::Transport {
            operation,
            message: err.to_string(),
        }
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::Decode {
        operation,
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Read one HTTP/1.1 request (headers plus `Content-Length` body).
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve exactly one request with `response`; the handle yields the raw
    /// request text.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn client(base_url: &str) -> HttpCommentService {
        HttpCommentService::new(base_url, Duration::from_secs(5), Duration::from_secs(2)).unwrap()
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let svc = client("http://localhost:8000/");
        assert_eq!(svc.base_url(), "http://localhost:8000");
        assert_eq!(svc.url("/extract"), "http://localhost:8000/extract");
    }

    #[tokio::test]
    async fn extract_posts_content_and_parses_points() {
        let (base, server) = serve_once(http_response(
            "200 OK",
            r#"["traffic safety","budget impact"]"#,
        ))
        .await;

        let points = client(&base).extract("road widening concerns").await.unwrap();
        assert_eq!(points, vec!["traffic safety", "budget impact"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /extract HTTP/1.1"));
        assert_eq!(
            request_body(&request),
            serde_json::json!({ "content": "road widening concerns" })
        );
    }

    #[tokio::test]
    async fn extract_500_is_status_error() {
        let (base, server) = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"detail":"Failed to extract key points"}"#,
        ))
        .await;

        let err = client(&base).extract("x").await.unwrap_err();
        match &err {
            ServiceError::Status {
                operation,
                status,
                body,
            } => {
                assert_eq!(*operation, "extract");
                assert_eq!(*status, 500);
                assert!(body.contains("Failed to extract"));
            }
            other => panic!("expected Status, got: {other:?}"),
        }
        assert!(!err.is_unreachable());
        let _ = server.await;
    }

    #[tokio::test]
    async fn extract_non_list_body_is_decode_error() {
        let (base, server) = serve_once(http_response("200 OK", r#"{"points":[]}"#)).await;

        let err = client(&base).extract("x").await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode { .. }));
        let _ = server.await;
    }

    #[tokio::test]
    async fn list_comments_sends_filter_query() {
        let (base, server) = serve_once(http_response(
            "200 OK",
            r#"[{"content":"A","key_points":["x"],"is_public":true}]"#,
        ))
        .await;

        let comments = client(&base)
            .list_comments(VisibilityFilter::PublicOnly)
            .await
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "A");
        assert_eq!(comments[0].key_points, vec!["x"]);

        let request = server.await.unwrap();
        assert!(
            request.starts_with("GET /api/comments?show_private=false HTTP/1.1"),
            "unexpected request line: {request}"
        );
    }

    #[tokio::test]
    async fn list_comments_include_private() {
        let (base, server) = serve_once(http_response("200 OK", "[]")).await;

        let comments = client(&base)
            .list_comments(VisibilityFilter::IncludePrivate)
            .await
            .unwrap();
        assert!(comments.is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/comments?show_private=true HTTP/1.1"));
    }

    #[tokio::test]
    async fn create_comment_sends_content_only() {
        let (base, server) = serve_once(http_response(
            "201 Created",
            r#"{"content":"road widening concerns","key_points":["traffic safety"],"is_public":true}"#,
        ))
        .await;

        client(&base)
            .create_comment(&NewComment::new("road widening concerns"))
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/comments HTTP/1.1"));
        assert_eq!(
            request_body(&request),
            serde_json::json!({ "content": "road widening concerns" })
        );
    }

    #[tokio::test]
    async fn create_comment_accepts_empty_body() {
        let (base, server) = serve_once(http_response("200 OK", "")).await;

        client(&base)
            .create_comment(&NewComment::new("x"))
            .await
            .expect("any 2xx is success");
        let _ = server.await;
    }

    #[tokio::test]
    async fn set_visibility_patches_path_query_and_body() {
        let (base, server) = serve_once(http_response("200 OK", r#"{"status":"ok"}"#)).await;

        client(&base)
            .set_visibility(CommentId(3), false)
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(
            request.starts_with("PATCH /api/comments/3/visibility?is_public=false HTTP/1.1"),
            "unexpected request line: {request}"
        );
        assert_eq!(
            request_body(&request),
            serde_json::json!({ "is_public": false })
        );
    }

    #[tokio::test]
    async fn set_visibility_404_is_status_error() {
        let (base, server) = serve_once(http_response(
            "404 Not Found",
            r#"{"detail":"not found"}"#,
        ))
        .await;

        let err = client(&base)
            .set_visibility(CommentId(99), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Status { status: 404, .. }));
        let _ = server.await;
    }

    #[tokio::test]
    async fn health_hits_healthz() {
        let (base, server) = serve_once(http_response("200 OK", r#"{"status":"ok"}"#)).await;

        client(&base).health().await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /healthz HTTP/1.1"));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut socket).await;
            // Never answer within the client's timeout.
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let svc = HttpCommentService::new(
            &format!("http://{addr}"),
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = svc.extract("x").await.unwrap_err();
        assert_eq!(err, ServiceError::Timeout { operation: "extract" });
        assert!(err.is_unreachable());
        server.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .list_comments(VisibilityFilter::PublicOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport { .. }));
        assert!(err.is_unreachable());
    }
}
