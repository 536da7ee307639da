use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{future, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::translator::TranslationJob;

/// Request body shared by `/translate` and `/translate/stream`.
///
/// Language codes are in 8-letter format, like "eng_Latn"; their list is
/// returned by `/list-languages`.
#[derive(Debug, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    #[serde(default = "default_src_lang")]
    pub src_lang: String,
    #[serde(default = "default_tgt_lang")]
    pub tgt_lang: String,
    #[serde(default = "default_true")]
    pub by_sentence: bool,
    #[serde(default = "default_true")]
    pub preprocess: bool,
}

fn default_src_lang() -> String {
    "eng_Latn".to_string()
}

fn default_tgt_lang() -> String {
    "fer_Latn".to_string()
}

fn default_true() -> bool {
    true
}

impl TranslationRequest {
    fn into_job(self) -> Result<TranslationJob> {
        if self.text.trim().is_empty() {
            return Err(AppError::Validation("text must not be empty".to_string()));
        }
        Ok(TranslationJob {
            text: self.text,
            src_lang: self.src_lang,
            tgt_lang: self.tgt_lang,
            by_sentence: self.by_sentence,
            preprocess: self.preprocess,
        })
    }
}

/// `POST /translate` - full translation in one response.
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslationRequest>,
) -> Result<Json<Value>> {
    let job = request.into_job()?;
    let output = state.translator.translate(&job).await?;
    Ok(Json(json!({ "translation": output })))
}

/// `POST /translate/stream` - same translation, forwarded chunk by chunk
/// as server-sent events. A mid-stream translator failure truncates the
/// stream; dropping the client drops the upstream pull with it.
pub async fn translate_stream(
    State(state): State<AppState>,
    Json(request): Json<TranslationRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let job = request.into_job()?;
    let chunks = state.translator.stream(&job).await?;

    let events = chunks
        .take_while(|chunk| {
            if let Err(e) = chunk {
                error!("Translation stream ended early: {}", e);
            }
            future::ready(chunk.is_ok())
        })
        .filter_map(|chunk| future::ready(chunk.ok().map(|text| Ok(Event::default().data(text)))));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// `GET /list-languages` - mapping of supported languages, from their
/// English names to their 8-letter codes.
pub async fn list_languages(State(state): State<AppState>) -> Json<HashMap<String, String>> {
    Json(state.translator.languages().clone())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use futures::stream;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::config::Config;
    use crate::error::{AppError, Result};
    use crate::routes;
    use crate::state::AppState;
    use crate::translator::mock::MockTranslator;
    use crate::translator::{ChunkStream, TranslationJob, Translator};

    fn test_app() -> Router {
        test_app_with(Arc::new(MockTranslator::new()))
    }

    fn test_app_with(translator: Arc<dyn Translator>) -> Router {
        let state = AppState::with_translator(Config::default(), translator);
        Router::new().merge(routes::create_routes()).with_state(state)
    }

    /// Translator whose stream dies after the first chunk.
    #[derive(Default)]
    struct FailingTranslator {
        languages: HashMap<String, String>,
    }

    #[async_trait]
    impl Translator for FailingTranslator {
        async fn translate(&self, _job: &TranslationJob) -> Result<String> {
            Ok("first second".to_string())
        }

        async fn stream(&self, _job: &TranslationJob) -> Result<ChunkStream> {
            Ok(Box::new(stream::iter(vec![
                Ok("first ".to_string()),
                Err(AppError::Translator("model fell over".to_string())),
                Ok("second".to_string()),
            ])))
        }

        fn languages(&self) -> &HashMap<String, String> {
            &self.languages
        }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn translate_returns_translation_field() {
        let response = test_app()
            .oneshot(post_json(
                "/translate",
                r#"{"text":"Hello world","src_lang":"eng_Latn","tgt_lang":"fer_Latn"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        let translation = body["translation"].as_str().unwrap();
        assert!(!translation.is_empty());
    }

    #[tokio::test]
    async fn translate_rejects_missing_text() {
        let response = test_app()
            .oneshot(post_json("/translate", r#"{"src_lang":"eng_Latn"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn translate_rejects_empty_text() {
        let response = test_app()
            .oneshot(post_json("/translate", r#"{"text":"  "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn stream_agrees_with_translate() {
        let body = r#"{"text":"one two three","src_lang":"eng_Latn","tgt_lang":"fer_Latn"}"#;

        let full = test_app().oneshot(post_json("/translate", body)).await.unwrap();
        let full: Value = serde_json::from_slice(&body_bytes(full).await).unwrap();
        let expected = full["translation"].as_str().unwrap().to_string();

        let streamed = test_app()
            .oneshot(post_json("/translate/stream", body))
            .await
            .unwrap();
        assert_eq!(streamed.status(), StatusCode::OK);
        assert_eq!(
            streamed
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap(),
            "text/event-stream"
        );

        let raw = String::from_utf8(body_bytes(streamed).await).unwrap();
        let concatenated: String = raw
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .collect();
        assert_eq!(concatenated, expected);
    }

    #[tokio::test]
    async fn upstream_failure_truncates_stream_without_error_marker() {
        let response = test_app_with(Arc::new(FailingTranslator::default()))
            .oneshot(post_json("/translate/stream", r#"{"text":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let raw = String::from_utf8(body_bytes(response).await).unwrap();
        let delivered: String = raw
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .collect();
        assert_eq!(delivered, "first ");
    }

    #[tokio::test]
    async fn list_languages_is_stable() {
        let first = test_app()
            .oneshot(Request::builder().uri("/list-languages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let first: Value = serde_json::from_slice(&body_bytes(first).await).unwrap();
        assert_eq!(first["English"], "eng_Latn");

        let second = test_app()
            .oneshot(Request::builder().uri("/list-languages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let second: Value = serde_json::from_slice(&body_bytes(second).await).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn health_reports_translator_status() {
        let response = test_app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["translator"], true);
        assert_eq!(body["connections"], 0);
    }
}
