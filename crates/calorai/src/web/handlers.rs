//! Route handlers for the form page.

use askama::Template;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use calorai_core::{AnalysisError, AnalysisRequest, UploadedImage};

use super::page::{render_markdown, IndexPage, Notice};
use super::AppState;

const MISSING_IMAGE_WARNING: &str = "⚠️ Please upload an image before analyzing.";

/// GET / - Serve an empty form.
pub async fn index(State(state): State<AppState>) -> Response {
    render(
        StatusCode::OK,
        IndexPage {
            prompt: &state.default_prompt,
            model: state.analyzer.model(),
            notice: None,
            result_html: None,
        },
    )
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Fields pulled out of the multipart form.
#[derive(Default)]
struct SubmittedForm {
    prompt: Option<String>,
    image: Option<UploadedImage>,
}

/// POST /analyze - Run one analysis and re-render the page with the outcome.
///
/// Analysis failures still answer 200 so the form stays on screen with the
/// user's prompt intact.
pub async fn analyze(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut form = SubmittedForm::default();
    if let Err(e) = read_form(&mut multipart, &mut form).await {
        let status = e.status();
        let notice = if status == StatusCode::PAYLOAD_TOO_LARGE {
            let max_mb = state.analyzer.options().limits.max_file_size_mb;
            tracing::warn!(max_mb, "Rejected oversized upload: {e}");
            Notice::warning(format!(
                "⚠️ Image too large: the upload exceeds the limit of {max_mb}MB"
            ))
        } else {
            tracing::warn!("Rejected form submission: {e}");
            Notice::error(format!("An error occurred: {}", e.body_text()))
        };

        // Fields read before the failure are kept
        let prompt = form.prompt.as_deref().unwrap_or(&*state.default_prompt);
        return render(
            status,
            IndexPage {
                prompt,
                model: state.analyzer.model(),
                notice: Some(notice),
                result_html: None,
            },
        );
    }

    let prompt = form
        .prompt
        .unwrap_or_else(|| state.default_prompt.to_string());
    let request = AnalysisRequest::new(prompt.clone(), form.image);

    let (notice, result_html) = match state.analyzer.analyze(request).await {
        Ok(result) => (
            Notice::success("Analysis complete!"),
            Some(render_markdown(&result.text)),
        ),
        Err(AnalysisError::MissingImage) => {
            tracing::warn!("Analyze triggered without an image");
            (Notice::warning(MISSING_IMAGE_WARNING), None)
        }
        Err(e) if e.is_input_error() => {
            tracing::warn!("Rejected upload: {e}");
            (Notice::warning(format!("⚠️ {e}")), None)
        }
        Err(e) => {
            tracing::error!(status = ?e.status_code(), "Analysis failed: {e}");
            (Notice::error(format!("An error occurred: {e}")), None)
        }
    };

    render(
        StatusCode::OK,
        IndexPage {
            prompt: &prompt,
            model: state.analyzer.model(),
            notice: Some(notice),
            result_html,
        },
    )
}

async fn read_form(
    multipart: &mut Multipart,
    form: &mut SubmittedForm,
) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "prompt" => {
                let text = field.text().await?;
                form.prompt = Some(normalize_newlines(text));
            }
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;

                // Browsers send an empty part when no file was picked
                if data.is_empty() {
                    continue;
                }

                let mut upload = UploadedImage::new(data.to_vec(), content_type);
                if let Some(name) = file_name.filter(|n| !n.is_empty()) {
                    upload = upload.with_file_name(name);
                }
                form.image = Some(upload);
            }
            _ => {}
        }
    }

    Ok(())
}

/// Textareas submit CRLF line breaks; the prompt is sent with LF.
fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text
    }
}

fn render(status: StatusCode, page: IndexPage<'_>) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{create_router, AppState};
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, Router};
    use calorai_core::{
        AnalysisPayload, AnalyzeOptions, Analyzer, LlmResponse, VisionProvider, DEFAULT_PROMPT,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const BOUNDARY: &str = "calorai-test-boundary";

    /// Provider stub that records every payload it receives.
    struct RecordingProvider {
        reply: Result<String, (u16, String)>,
        calls: Arc<AtomicU32>,
        payloads: Arc<Mutex<Vec<AnalysisPayload>>>,
    }

    #[async_trait]
    impl VisionProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "gemini-test"
        }

        async fn generate(&self, payload: &AnalysisPayload) -> Result<LlmResponse, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: "gemini-test".into(),
                    tokens_used: None,
                    latency_ms: 1,
                }),
                Err((status, message)) => Err(AnalysisError::Backend {
                    message: format!("Gemini HTTP {status}: {message}"),
                    status_code: Some(*status),
                }),
            }
        }
    }

    struct Harness {
        app: Router,
        calls: Arc<AtomicU32>,
        payloads: Arc<Mutex<Vec<AnalysisPayload>>>,
    }

    fn harness_with(reply: Result<String, (u16, String)>, options: AnalyzeOptions) -> Harness {
        let calls = Arc::new(AtomicU32::new(0));
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let provider = RecordingProvider {
            reply,
            calls: calls.clone(),
            payloads: payloads.clone(),
        };
        let analyzer = Analyzer::new(Box::new(provider), options);
        Harness {
            app: create_router(AppState::new(analyzer, DEFAULT_PROMPT)),
            calls,
            payloads,
        }
    }

    fn harness(reply: Result<String, (u16, String)>) -> Harness {
        harness_with(reply, AnalyzeOptions::default())
    }

    fn jpeg(len: usize) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(len, 0x11);
        bytes
    }

    /// Build a multipart body with an optional prompt and an optional file part.
    fn multipart(prompt: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(prompt) = prompt {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"prompt\"\r\n\r\n{prompt}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_prefills_default_prompt() {
        let h = harness(Ok("unused".into()));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Analyze Nutrition"));
        assert!(body.contains(DEFAULT_PROMPT));
        assert!(body.contains("gemini-test"));
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(Ok("unused".into()));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_analyze_shows_result_under_success_notice() {
        let h = harness(Ok("Total calories: 450".into()));
        // Browsers submit the unedited textarea with CRLF line breaks
        let submitted = DEFAULT_PROMPT.replace('\n', "\r\n");
        let image = jpeg(10 * 1024);

        let request = multipart(
            Some(&submitted),
            Some(("meal.jpg", "image/jpeg", &image)),
        );
        let (status, body) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Analysis complete!"));
        assert!(body.contains("<p>Total calories: 450</p>"));
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);

        let payloads = h.payloads.lock().unwrap();
        assert_eq!(payloads[0].prompt, DEFAULT_PROMPT);
        assert_eq!(payloads[0].images.len(), 1);
        assert_eq!(payloads[0].images[0].media_type, "image/jpeg");
        assert_eq!(payloads[0].images[0].data, image);
    }

    #[tokio::test]
    async fn test_missing_prompt_field_uses_default() {
        let h = harness(Ok("ok".into()));
        let image = jpeg(64);
        let request = multipart(None, Some(("meal.jpg", "image/jpeg", &image)));
        send(&h.app, request).await;

        assert_eq!(h.payloads.lock().unwrap()[0].prompt, DEFAULT_PROMPT);
    }

    #[tokio::test]
    async fn test_analyze_without_image_warns_and_skips_backend() {
        let h = harness(Ok("should not reach".into()));
        let (status, body) = send(&h.app, multipart(Some("Count calories"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please upload an image before analyzing."));
        assert!(body.contains("class=\"notice warning\""));
        assert!(body.contains("Count calories"));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_file_part_counts_as_missing() {
        let h = harness(Ok("should not reach".into()));
        let request = multipart(
            Some("Count calories"),
            Some(("", "application/octet-stream", &[])),
        );
        let (_, body) = send(&h.app, request).await;

        assert!(body.contains("Please upload an image before analyzing."));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_warns() {
        let h = harness(Ok("should not reach".into()));
        let request = multipart(
            Some("Count calories"),
            Some(("meal.gif", "image/gif", b"GIF89a")),
        );
        let (status, body) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Unsupported media type: image/gif"));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_error_shown_and_form_still_usable() {
        let h = harness(Err((500, "boom".into())));
        let image = jpeg(128);

        for _ in 0..2 {
            let request = multipart(
                Some("My prompt"),
                Some(("meal.png", "image/jpeg", &image)),
            );
            let (status, body) = send(&h.app, request).await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("An error occurred: Backend error: Gemini HTTP 500: boom"));
            assert!(body.contains("class=\"notice error\""));
            assert!(body.contains("My prompt"));
            assert!(body.contains("Analyze Nutrition"));
        }
        assert_eq!(h.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_oversized_body_warns_with_limit() {
        let mut options = AnalyzeOptions::default();
        options.limits.max_file_size_mb = 1;
        let h = harness_with(Ok("should not reach".into()), options);
        let image = jpeg(3 * 1024 * 1024);

        let request = multipart(
            Some("Keep my prompt"),
            Some(("big.jpg", "image/jpeg", &image)),
        );
        let (status, body) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body.contains("class=\"notice warning\""));
        assert!(body.contains("exceeds the limit of 1MB"));
        assert!(body.contains("Keep my prompt"));
        assert!(!body.contains("An error occurred"));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_over_file_limit_warns() {
        let mut options = AnalyzeOptions::default();
        options.limits.max_file_size_mb = 1;
        let h = harness_with(Ok("should not reach".into()), options);
        let image = jpeg(1024 * 1024 + 512 * 1024);

        let request = multipart(
            Some("Keep my prompt"),
            Some(("big.jpg", "image/jpeg", &image)),
        );
        let (status, body) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("class=\"notice warning\""));
        assert!(body.contains("Image too large"));
        assert!(body.contains("Keep my prompt"));
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\r\n".into()), "a\nb\n");
        assert_eq!(normalize_newlines("plain".into()), "plain");
    }
}
