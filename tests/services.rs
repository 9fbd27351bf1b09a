//! HTTP client tests against a local stub server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use mothersync::services::{GenerativeService, SpeechService, TranslationService};
use mothersync::{
    Error, GeminiClient, GoogleTranslateClient, Language, Resilient, RetryPolicy, TextToSpeech,
};
use secrecy::SecretString;
use serde_json::{Value, json};

mod common;
use common::png_upload;

/// A request seen by the stub server
#[derive(Debug, Clone)]
struct Recorded {
    uri: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Recorded {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Serve `app` on an ephemeral port and return its base URL
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Stub answering every request with `status` and `body`, recording requests
async fn stub(status: StatusCode, content_type: &'static str, body: &'static str) -> (String, Log) {
    let log: Log = Arc::default();
    let seen = log.clone();
    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body_in: Bytes| {
        let seen = seen.clone();
        async move {
            seen.lock().unwrap().push(Recorded {
                uri: uri.to_string(),
                headers,
                body: body_in,
            });
            (status, [("content-type", content_type)], body)
        }
    });
    (serve(app).await, log)
}

fn gemini(base_url: &str) -> GeminiClient {
    GeminiClient::new(SecretString::from("test-key".to_string()))
        .unwrap()
        .with_base_url(base_url.to_string())
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        timeout: Duration::from_secs(5),
    }
}

const GEMINI_REPLY: &str =
    r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Looks like cheese."}]}}]}"#;

#[tokio::test]
async fn test_gemini_sends_prompt_and_image() {
    let (url, log) = stub(StatusCode::OK, "application/json", GEMINI_REPLY).await;
    let client = gemini(&url).with_temperature(0.5);
    let upload = png_upload();

    let reply = client.generate("What is this?", Some(&upload)).await.unwrap();
    assert_eq!(reply.as_deref(), Some("Looks like cheese."));

    let requests = log.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.uri,
        "/v1beta/models/gemini-1.5-flash:generateContent"
    );
    assert_eq!(request.headers["x-goog-api-key"], "test-key");

    let body = request.json();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(parts[0]["text"], "What is this?");
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    assert!(parts[1]["inline_data"]["data"].as_str().is_some_and(|d| !d.is_empty()));
    assert_eq!(body["generationConfig"]["temperature"], json!(0.5));
}

#[tokio::test]
async fn test_gemini_text_only_prompt() {
    let (url, log) = stub(StatusCode::OK, "application/json", GEMINI_REPLY).await;

    gemini(&url)
        .with_model("gemini-1.5-pro".to_string())
        .generate("hello", None)
        .await
        .unwrap();

    let request = log.lock().unwrap()[0].clone();
    assert_eq!(request.uri, "/v1beta/models/gemini-1.5-pro:generateContent");
    assert_eq!(request.json()["contents"][0]["parts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gemini_blocked_prompt_is_none() {
    let (url, _) = stub(
        StatusCode::OK,
        "application/json",
        r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#,
    )
    .await;

    assert_eq!(gemini(&url).generate("hello", None).await.unwrap(), None);
}

#[tokio::test]
async fn test_gemini_status_errors() {
    let (url, _) = stub(StatusCode::BAD_REQUEST, "application/json", r#"{"error":{}}"#).await;
    let err = gemini(&url).generate("hello", None).await.unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
    assert!(!err.is_recoverable());

    let (url, _) = stub(StatusCode::TOO_MANY_REQUESTS, "text/plain", "slow down").await;
    let err = gemini(&url).generate("hello", None).await.unwrap_err();
    assert!(matches!(err, Error::Unavailable(_)));
}

#[tokio::test]
async fn test_resilient_retries_until_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response()
            } else {
                (
                    StatusCode::OK,
                    [("content-type", "application/json")],
                    GEMINI_REPLY,
                )
                    .into_response()
            }
        }
    });
    let url = serve(app).await;

    let client = Resilient::new(gemini(&url), fast_policy(3));
    let reply = client.generate("hello", None).await.unwrap();

    assert_eq!(reply.as_deref(), Some("Looks like cheese."));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_resilient_gives_up_after_max_retries() {
    let (url, log) = stub(StatusCode::BAD_GATEWAY, "text/plain", "upstream down").await;

    let client = Resilient::new(gemini(&url), fast_policy(2));
    let err = client.generate("hello", None).await.unwrap_err();

    assert!(matches!(err, Error::Unavailable(_)));
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_resilient_does_not_retry_permanent_errors() {
    let (url, log) = stub(StatusCode::FORBIDDEN, "text/plain", "bad key").await;

    let client = Resilient::new(gemini(&url), fast_policy(3));
    let err = client.generate("hello", None).await.unwrap_err();

    assert!(matches!(err, Error::Generation(_)));
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resilient_times_out_slow_calls() {
    let app = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "too late"
    });
    let url = serve(app).await;

    let policy = RetryPolicy {
        timeout: Duration::from_millis(50),
        ..fast_policy(0)
    };
    let client = Resilient::new(
        GoogleTranslateClient::new().with_base_url(url),
        policy,
    );
    let err = client.translate("hello", Language::Tamil).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Timeout {
            operation: "translate",
            ..
        }
    ));
}

#[tokio::test]
async fn test_translate_scrapes_result() {
    let (url, log) = stub(
        StatusCode::OK,
        "text/html; charset=utf-8",
        r#"<html><body><div class="result-container">வணக்கம் உலகம்</div></body></html>"#,
    )
    .await;

    let client = GoogleTranslateClient::new().with_base_url(url);
    let text = client.translate("hello world", Language::Tamil).await.unwrap();

    assert_eq!(text, "வணக்கம் உலகம்");
    let request = log.lock().unwrap()[0].clone();
    assert_eq!(request.uri, "/m?sl=auto&tl=ta&q=hello%20world");
}

#[tokio::test]
async fn test_translate_without_result_fails() {
    let (url, _) = stub(StatusCode::OK, "text/html", "<html><body>captcha</body></html>").await;

    let client = GoogleTranslateClient::new().with_base_url(url);
    let err = client.translate("hello", Language::Hindi).await.unwrap_err();
    assert!(matches!(err, Error::Translation(_)));
}

#[tokio::test]
async fn test_google_tts_chunks_long_text() {
    let (url, log) = stub(StatusCode::OK, "audio/mpeg", "mp3|").await;

    let text = vec!["word"; 90].join(" ");
    let tts = TextToSpeech::new_google().with_base_url(url);
    let audio = tts.synthesize(&text, Language::Malayalam).await.unwrap();

    let requests = log.lock().unwrap().clone();
    assert_eq!(requests.len(), 3);
    assert_eq!(audio, b"mp3|mp3|mp3|");
    for request in &requests {
        assert!(request.uri.starts_with("/translate_tts?ie=UTF-8&client=tw-ob&tl=ml&q=word"));
    }
}

#[tokio::test]
async fn test_google_tts_speaks_cleaned_text() {
    let (url, log) = stub(StatusCode::OK, "audio/mpeg", "mp3").await;

    let tts = TextToSpeech::new_google().with_base_url(url);
    tts.synthesize("**Hello** [there]", Language::English)
        .await
        .unwrap();

    let request = log.lock().unwrap()[0].clone();
    assert!(request.uri.ends_with("&tl=en&q=Hello%20there"));
}

#[tokio::test]
async fn test_openai_tts_request() {
    let (url, log) = stub(StatusCode::OK, "audio/mpeg", "ID3").await;

    let tts = TextToSpeech::new_openai(
        SecretString::from("sk-test".to_string()),
        "nova".to_string(),
        1.25,
    )
    .unwrap()
    .with_base_url(url);
    let audio = tts.synthesize("Good night", Language::English).await.unwrap();

    assert_eq!(audio, b"ID3");
    let request = log.lock().unwrap()[0].clone();
    assert_eq!(request.uri, "/v1/audio/speech");
    assert_eq!(request.headers["authorization"], "Bearer sk-test");
    let body = request.json();
    assert_eq!(body["model"], "tts-1");
    assert_eq!(body["input"], "Good night");
    assert_eq!(body["voice"], "nova");
    assert_eq!(body["speed"], json!(1.25));
}

#[tokio::test]
async fn test_tts_server_error_is_recoverable() {
    let (url, _) = stub(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "oops").await;

    let tts = TextToSpeech::new_google().with_base_url(url);
    let err = tts.synthesize("hello", Language::Telugu).await.unwrap_err();
    assert!(err.is_recoverable());
}
