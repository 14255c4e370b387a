//! HTTP route handlers: pages, generation, and test-case bookkeeping.

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use casegen_completion::CompletionError;
use casegen_core::{ExtractionResult, GenerationKind};
use serde::Deserialize;
use serde_json::Value;

use super::json_error;
use super::pages;
use super::state::AppState;
use crate::generate::{run_generation, GenerationRequest};

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /
pub(crate) async fn handle_index(State(state): State<Arc<AppState>>) -> Response {
    render_page(pages::render_index(&state.default_model))
}

#[derive(Deserialize)]
pub(crate) struct FunctionForm {
    code: Option<String>,
    model: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct RequirementForm {
    requirement: Option<String>,
    model: Option<String>,
}

/// POST /generate/function
pub(crate) async fn handle_generate_function(
    State(state): State<Arc<AppState>>,
    form: Result<Form<FunctionForm>, FormRejection>,
) -> Response {
    let (code, model) = match form {
        Ok(Form(f)) => (f.code, f.model),
        Err(_) => (None, None),
    };
    let code = match code.filter(|c| !c.is_empty()) {
        Some(c) => c,
        None => return json_error(StatusCode::BAD_REQUEST, "No code provided").into_response(),
    };

    generate_page(&state, GenerationKind::Function, code, model.as_deref()).await
}

/// POST /generate/requirement
pub(crate) async fn handle_generate_requirement(
    State(state): State<Arc<AppState>>,
    form: Result<Form<RequirementForm>, FormRejection>,
) -> Response {
    let (requirement, model) = match form {
        Ok(Form(f)) => (f.requirement, f.model),
        Err(_) => (None, None),
    };
    let requirement = match requirement.filter(|r| !r.is_empty()) {
        Some(r) => r,
        None => {
            return json_error(StatusCode::BAD_REQUEST, "No requirement provided").into_response()
        }
    };

    generate_page(&state, GenerationKind::Requirement, requirement, model.as_deref()).await
}

/// POST /api/generate
///
/// Extraction failures are still 200: the body carries `error` and `raw`.
pub(crate) async fn handle_api_generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let data = match payload {
        Ok(Json(v)) if !is_falsy(&v) => v,
        _ => return json_error(StatusCode::BAD_REQUEST, "Invalid request").into_response(),
    };

    let content = match data.get("content").and_then(Value::as_str) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => return json_error(StatusCode::BAD_REQUEST, "Content is required").into_response(),
    };

    let kind = match data
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<GenerationKind>().ok())
    {
        Some(k) => k,
        None => {
            return json_error(StatusCode::BAD_REQUEST, "Invalid generation type").into_response()
        }
    };

    let stop = match parse_stop(data.get("stop")) {
        Some(s) => s,
        None => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "'stop' must be an array of strings",
            )
            .into_response()
        }
    };

    let request = GenerationRequest {
        kind,
        content,
        model: state.resolve_model(data.get("model").and_then(Value::as_str)),
        stop,
    };

    match generate(&state, request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(response) => response,
    }
}

/// POST /api/add_test_case
///
/// The list only lives for the duration of this request; nothing is stored.
pub(crate) async fn handle_add_test_case(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let data = match payload {
        Ok(Json(v)) if !is_falsy(&v) => v,
        _ => return json_error(StatusCode::BAD_REQUEST, "无效的请求数据").into_response(),
    };

    let all_test_cases = match append_test_case(&data) {
        Some(list) => list,
        None => {
            return json_error(StatusCode::BAD_REQUEST, "测试用例数据不能为空").into_response()
        }
    };

    let class_count = data
        .get("equivalence_classes")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    tracing::info!(
        test_cases = all_test_cases.len(),
        equivalence_classes = class_count,
        "test case added"
    );

    let response = serde_json::json!({
        "success": true,
        "message": "测试用例已成功添加",
    });
    (StatusCode::OK, Json(response)).into_response()
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// The caller's `all_test_cases` (or an empty list) with `test_case` appended.
/// `None` when `test_case` is missing or empty.
fn append_test_case(data: &Value) -> Option<Vec<Value>> {
    let test_case = data.get("test_case").filter(|tc| !is_falsy(tc))?;
    let mut all = data
        .get("all_test_cases")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    all.push(test_case.clone());
    Some(all)
}

/// JSON values treated as "nothing was sent": null, false, 0, "", [], {}.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Optional `stop` list. `None` means present but not an array of strings.
fn parse_stop(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(_) => None,
    }
}

/// Run the pipeline on the blocking pool and map outbound failures to HTTP.
async fn generate(
    state: &Arc<AppState>,
    request: GenerationRequest,
) -> Result<ExtractionResult, Response> {
    let completer = Arc::clone(&state.completer);
    let result =
        tokio::task::spawn_blocking(move || run_generation(completer.as_ref(), &request)).await;

    match result {
        Ok(Ok(extraction)) => Ok(extraction),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "completion request failed");
            Err(completion_error_response(&e))
        }
        Err(e) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("task join error: {}", e),
        )
        .into_response()),
    }
}

/// Generate and render the results page.
async fn generate_page(
    state: &Arc<AppState>,
    kind: GenerationKind,
    content: String,
    model: Option<&str>,
) -> Response {
    let model = state.resolve_model(model);
    let request = GenerationRequest {
        kind,
        content: content.clone(),
        model: model.clone(),
        stop: Vec::new(),
    };

    match generate(state, request).await {
        Ok(result) => render_page(pages::render_results(kind, &content, &model, &result)),
        Err(response) => response,
    }
}

fn completion_error_response(error: &CompletionError) -> Response {
    let status = match error {
        CompletionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CompletionError::Transport(_)
        | CompletionError::Remote { .. }
        | CompletionError::MalformedReply(_) => StatusCode::BAD_GATEWAY,
    };
    json_error(status, &error.to_string()).into_response()
}

fn render_page(rendered: askama::Result<String>) -> Response {
    match rendered {
        Ok(body) => Html(body).into_response(),
        Err(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("failed to render page: {}", e),
        )
        .into_response(),
    }
}
