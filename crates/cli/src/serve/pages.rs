//! HTML pages: the input form and the results view.

use askama::Template;
use casegen_core::{ExtractionResult, GenerationKind};
use serde_json::Value;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    default_model: &'a str,
}

/// One row of the equivalence-class table.
struct ClassRow {
    id: String,
    input_condition: String,
    valid_class: String,
    invalid_class: String,
    boundary_value: String,
}

/// One row of the test-case table.
struct CaseRow {
    test_case_id: String,
    input_data: String,
    expected_result: String,
    description: String,
    covers: String,
}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsPage<'a> {
    kind_label: &'a str,
    content: &'a str,
    model: &'a str,
    failed: bool,
    error_message: String,
    raw: String,
    classes: Vec<ClassRow>,
    cases: Vec<CaseRow>,
    payload_json: String,
}

pub(crate) fn render_index(default_model: &str) -> askama::Result<String> {
    IndexPage { default_model }.render()
}

/// Render a generation outcome together with the submitted content.
pub(crate) fn render_results(
    kind: GenerationKind,
    content: &str,
    model: &str,
    result: &ExtractionResult,
) -> askama::Result<String> {
    let page = match result {
        ExtractionResult::Parsed(payload) => ResultsPage {
            kind_label: kind.label(),
            content,
            model,
            failed: false,
            error_message: String::new(),
            raw: String::new(),
            classes: class_rows(payload),
            cases: case_rows(payload),
            payload_json: serde_json::to_string_pretty(payload).unwrap_or_default(),
        },
        ExtractionResult::Failed(failure) => ResultsPage {
            kind_label: kind.label(),
            content,
            model,
            failed: true,
            error_message: failure.message.clone(),
            raw: failure.raw.clone(),
            classes: Vec::new(),
            cases: Vec::new(),
            payload_json: String::new(),
        },
    };
    page.render()
}

fn class_rows(payload: &Value) -> Vec<ClassRow> {
    objects(payload, "equivalence_classes")
        .map(|row| ClassRow {
            id: cell(row, "id"),
            input_condition: cell(row, "input_condition"),
            valid_class: cell(row, "valid_class"),
            invalid_class: cell(row, "invalid_class"),
            boundary_value: cell(row, "boundary_value"),
        })
        .collect()
}

fn case_rows(payload: &Value) -> Vec<CaseRow> {
    objects(payload, "test_cases")
        .map(|row| CaseRow {
            test_case_id: cell(row, "test_case_id"),
            input_data: cell(row, "input_data"),
            expected_result: cell(row, "expected_result"),
            description: cell(row, "description"),
            covers: match row.get("covers_equivalence_classes").and_then(Value::as_array) {
                Some(ids) => ids.iter().map(text_of).collect::<Vec<_>>().join(", "),
                None => cell(row, "covers_equivalence_classes"),
            },
        })
        .collect()
}

/// Object elements of `payload[key]`; anything else is skipped.
fn objects<'a>(payload: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| v.is_object())
}

fn cell(row: &Value, key: &str) -> String {
    row.get(key).map(text_of).unwrap_or_default()
}

/// Display text for a JSON value: strings bare, null empty, the rest as JSON.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casegen_core::extract;
    use serde_json::json;

    #[test]
    fn index_shows_both_forms_and_default_model() {
        let html = render_index("test-model-v2").unwrap();
        assert!(html.contains("action=\"/generate/function\""));
        assert!(html.contains("action=\"/generate/requirement\""));
        assert!(html.contains("name=\"code\""));
        assert!(html.contains("name=\"requirement\""));
        assert!(html.contains("test-model-v2"));
    }

    #[test]
    fn results_render_tables_from_payload() {
        let payload = json!({
            "equivalence_classes": [
                {"input_condition": "标题长度", "valid_class": "长度为1~40字符", "invalid_class": "", "boundary_value": "", "id": 1}
            ],
            "test_cases": [
                {
                    "test_case_id": "TC-01",
                    "input_data": {"标题": "我的标题"},
                    "expected_result": "设置成功",
                    "description": "有效标题",
                    "covers_equivalence_classes": [1, 7]
                }
            ]
        });
        let html = render_results(
            GenerationKind::Requirement,
            "标题长度为1~40字符",
            "m",
            &ExtractionResult::Parsed(payload),
        )
        .unwrap();
        assert!(html.contains(GenerationKind::Requirement.label()));
        assert!(html.contains("长度为1~40字符"));
        assert!(html.contains("TC-01"));
        assert!(html.contains("设置成功"));
        assert!(html.contains("1, 7"));
    }

    #[test]
    fn results_show_failure_and_raw_reply() {
        let result = extract("the model said <b>no");
        let html = render_results(GenerationKind::Function, "def f(): pass", "m", &result).unwrap();
        assert!(html.contains("Invalid response format"));
        assert!(html.contains("&lt;b&gt;no"));
        assert!(!html.contains("<b>no"));
    }

    #[test]
    fn submitted_content_is_escaped() {
        let html = render_results(
            GenerationKind::Function,
            "if a < b && c > d: return '<script>'",
            "m",
            &ExtractionResult::Parsed(json!({})),
        )
        .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn text_of_renders_scalars_plainly() {
        assert_eq!(text_of(&json!("a")), "a");
        assert_eq!(text_of(&json!(3)), "3");
        assert_eq!(text_of(&Value::Null), "");
        assert_eq!(text_of(&json!({"k": 1})), "{\"k\":1}");
    }

    #[test]
    fn non_object_rows_are_skipped() {
        let payload = json!({"test_cases": ["oops", {"test_case_id": "TC-02"}]});
        let rows = case_rows(&payload);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_case_id, "TC-02");
    }
}
