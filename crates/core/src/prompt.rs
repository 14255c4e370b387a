//! Prompt construction: fixed test-design instruction + one user message.
//!
//! The exchange is always exactly two messages, system first. The remote
//! endpoint receives it serialized as a single JSON text blob (see
//! [`serialize_exchange`]).

use serde::{Deserialize, Serialize};

use crate::kind::GenerationKind;

/// Test-design instruction sent as the system message of every exchange.
///
/// Asks the model for an equivalence-class/boundary table, a test-case
/// table, and finally a JSON document with `equivalence_classes` and
/// `test_cases` arrays.
pub const SYSTEM_PROMPT: &str = include_str!("../prompts/test_design.txt");

/// Prefix of every user message.
const USER_PREFIX: &str = "功能需求描述：";

/// Lead-in placed before a fenced function snippet.
const FUNCTION_LEAD_IN: &str = "分析以下函数代码并生成测试用例：";

/// Language tag on the code fence wrapping submitted functions.
const FUNCTION_FENCE_LANG: &str = "python";

/// Chat role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Build the two-message exchange for `content`.
///
/// Function snippets are wrapped in a code fence; requirements are embedded
/// as-is. Content is not validated here -- empty input is rejected at the
/// request boundary, not by the builder.
pub fn build_messages(kind: GenerationKind, content: &str) -> Vec<ChatMessage> {
    let body = match kind {
        GenerationKind::Function => format!(
            "{}\n```{}\n{}\n```",
            FUNCTION_LEAD_IN, FUNCTION_FENCE_LANG, content
        ),
        GenerationKind::Requirement => content.to_string(),
    };

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{}{}", USER_PREFIX, body)),
    ]
}

/// Render an exchange as one JSON text blob (non-ASCII left unescaped).
pub fn serialize_exchange(messages: &[ChatMessage]) -> String {
    serde_json::to_string(messages).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_is_system_then_user() {
        for kind in [GenerationKind::Function, GenerationKind::Requirement] {
            let messages = build_messages(kind, "x > 0");
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].role, Role::System);
            assert_eq!(messages[0].content, SYSTEM_PROMPT);
            assert_eq!(messages[1].role, Role::User);
            assert!(messages[1].content.contains("x > 0"));
        }
    }

    #[test]
    fn function_content_is_fenced() {
        let code = "def add(a, b):\n    return a + b";
        let messages = build_messages(GenerationKind::Function, code);
        let user = &messages[1].content;
        assert!(user.starts_with(USER_PREFIX));
        assert!(user.contains(&format!("```python\n{}\n```", code)));
    }

    #[test]
    fn requirement_content_is_embedded_verbatim() {
        let requirement = "标题长度为1~40字符，不能包含 / : * ?";
        let messages = build_messages(GenerationKind::Requirement, requirement);
        assert_eq!(
            messages[1].content,
            format!("{}{}", USER_PREFIX, requirement)
        );
        assert!(!messages[1].content.contains("```"));
    }

    #[test]
    fn empty_content_is_accepted_structurally() {
        let messages = build_messages(GenerationKind::Requirement, "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, USER_PREFIX);
    }

    #[test]
    fn system_prompt_asks_for_json_payload() {
        assert!(SYSTEM_PROMPT.contains("equivalence_classes"));
        assert!(SYSTEM_PROMPT.contains("test_cases"));
    }

    #[test]
    fn serialized_exchange_round_trips_and_keeps_unicode() {
        let messages = build_messages(GenerationKind::Requirement, "用户名非空");
        let blob = serialize_exchange(&messages);
        assert!(blob.contains("用户名非空"));
        assert!(blob.starts_with("[{\"role\":\"system\""));

        let back: Vec<ChatMessage> = serde_json::from_str(&blob).unwrap();
        assert_eq!(back, messages);
    }
}
