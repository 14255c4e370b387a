//! Generation pipeline: prompt -> completion -> extraction.
//!
//! Shared by the HTTP handlers and the `generate` command. Blocking; async
//! callers run it on the blocking pool.

use casegen_completion::{Completer, CompletionError, CompletionRequest};
use casegen_core::{build_messages, extract, serialize_exchange, ExtractionResult, GenerationKind};

/// One generation call. Model selection travels with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenerationRequest {
    pub(crate) kind: GenerationKind,
    pub(crate) content: String,
    pub(crate) model: String,
    pub(crate) stop: Vec<String>,
}

/// Run one generation. Extraction failures are data (`Ok(Failed(..))`);
/// only outbound failures are errors.
pub(crate) fn run_generation(
    completer: &dyn Completer,
    request: &GenerationRequest,
) -> Result<ExtractionResult, CompletionError> {
    let messages = build_messages(request.kind, &request.content);
    let completion = CompletionRequest {
        model: request.model.clone(),
        prompt: serialize_exchange(&messages),
        stop: request.stop.clone(),
    };

    tracing::info!(kind = %request.kind, model = %request.model, "generating test cases");
    let reply = completer.complete(&completion)?;
    tracing::debug!(reply = %reply, "model reply");

    let result = extract(&reply);
    if let ExtractionResult::Failed(failure) = &result {
        tracing::warn!(
            error = %failure,
            raw_chars = failure.raw.chars().count(),
            "model reply could not be parsed"
        );
    }
    Ok(result)
}


#[cfg(test)]
mod tests {
    use super::stub::StubCompleter;
    use super::*;
    use casegen_core::{ChatMessage, FailureKind, Role};
    use serde_json::json;

    fn request(kind: GenerationKind, content: &str) -> GenerationRequest {
        GenerationRequest {
            kind,
            content: content.to_string(),
            model: "test-model".to_string(),
            stop: vec!["<|end|>".to_string()],
        }
    }

    #[test]
    fn parses_fenced_reply() {
        let stub = StubCompleter::replying(
            "结果：\n```json\n{\"equivalence_classes\": [], \"test_cases\": []}\n```",
        );
        let result = run_generation(&stub, &request(GenerationKind::Requirement, "标题非空")).unwrap();
        assert_eq!(
            result,
            ExtractionResult::Parsed(json!({"equivalence_classes": [], "test_cases": []}))
        );
    }

    #[test]
    fn sends_serialized_exchange_with_model_and_stop() {
        let stub = StubCompleter::replying("{}");
        let code = "def f(x):\n    return x * 2";
        run_generation(&stub, &request(GenerationKind::Function, code)).unwrap();

        let seen = stub.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "test-model");
        assert_eq!(seen[0].stop, vec!["<|end|>".to_string()]);

        let exchange: Vec<ChatMessage> = serde_json::from_str(&seen[0].prompt).unwrap();
        assert_eq!(exchange.len(), 2);
        assert_eq!(exchange[0].role, Role::System);
        assert_eq!(exchange[1].role, Role::User);
        assert!(exchange[1].content.contains(code));
    }

    #[test]
    fn unparseable_reply_is_data_not_error() {
        let stub = StubCompleter::replying("I cannot help with that.");
        let result = run_generation(&stub, &request(GenerationKind::Requirement, "x")).unwrap();
        let failure = result.failure().expect("failure variant");
        assert_eq!(failure.kind, FailureKind::InvalidResponseFormat);
        assert_eq!(failure.raw, "I cannot help with that.");
    }

    #[test]
    fn completion_errors_propagate() {
        let stub = StubCompleter::failing(CompletionError::Transport("refused".to_string()));
        let err = run_generation(&stub, &request(GenerationKind::Function, "x")).unwrap_err();
        assert_eq!(err, CompletionError::Transport("refused".to_string()));
    }
}
