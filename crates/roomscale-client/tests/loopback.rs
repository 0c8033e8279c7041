//! Integration test: drive `GeminiClient` against a one-shot HTTP server
//! on the loopback interface.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use roomscale_analysis::{AnalysisRequest, ErrorKind, ImageMime, InferenceService, analyze};
use roomscale_client::{ClientConfig, GeminiClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, capture the raw request, answer with `status`
/// and `body`.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending a full request");
            raw.extend_from_slice(&chunk[..n]);
            if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase();
                let length: usize = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map_or(0, |v| v.trim().parse().unwrap());
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8(raw).unwrap()
    });

    (endpoint, handle)
}

fn client(endpoint: &str) -> GeminiClient {
    let config = ClientConfig::default()
        .with_api_key(Some("test-key".into()))
        .with_endpoint(endpoint);
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    GeminiClient::with_http_client(&config, http).unwrap()
}

fn request() -> AnalysisRequest {
    AnalysisRequest {
        image_base64: "aGVsbG8=".into(),
        mime: ImageMime::Png,
    }
}

/// Wrap `text` the way `generateContent` does.
fn candidate(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn sends_one_authenticated_post() {
    let (endpoint, server) = serve_once("200 OK", candidate("{}")).await;
    let text = client(&endpoint).generate(&request()).await.unwrap();
    assert_eq!(text, "{}");

    let raw = server.await.unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    assert!(
        head.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent HTTP/1.1"),
        "got {head}"
    );
    assert!(head.to_ascii_lowercase().contains("x-goog-api-key: test-key"));

    let body: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "aGVsbG8=");
    assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
}

#[tokio::test]
async fn rate_limit_surfaces_upstream_message() {
    let error = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
    let (endpoint, server) = serve_once("429 Too Many Requests", error.to_owned()).await;

    let err = client(&endpoint).generate(&request()).await.unwrap_err();
    server.await.unwrap();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.to_string(), "error analyzing image: Quota exceeded");
}

#[tokio::test]
async fn full_pipeline_over_http() {
    let model_text = r#"{"dimensions":[{"label":"Room Width","estimate":"~12 feet"}],"annotatedImageSvg":"<svg><rect x=\"10\" y=\"10\" width=\"80\" height=\"80\" fill=\"none\" stroke=\"red\"/></svg>"}"#;
    let (endpoint, server) = serve_once("200 OK", candidate(model_text)).await;

    let analysis = analyze(&client(&endpoint), b"\x89PNG\r\n\x1a\n", ImageMime::Png)
        .await
        .unwrap();
    server.await.unwrap();
    assert_eq!(analysis.dimensions.len(), 1);
    assert_eq!(analysis.dimensions[0].label, "Room Width");
    assert!(analysis.overlay.as_str().contains("<rect"));
}

#[tokio::test]
async fn unreachable_endpoint_is_service_error() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&endpoint).generate(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
}
