/// Pull the user-authored prompt text out of an upstream request body.
/// Tries, in order: a top-level `prompt` string (legacy completion
/// APIs), a top-level `input` string (some Ollama-compatible bodies),
/// then the last user-role message in a chat-style `messages` array.
/// Returns `None` when nothing recognizable is present — callers treat
/// that as "nothing to analyze", not an error.
pub fn extract_prompt(body: &serde_json::Value) -> Option<String> {
    if let Some(prompt) = body.get("prompt").and_then(|v| v.as_str()) {
        return Some(prompt.to_string());
    }
    if let Some(input) = body.get("input").and_then(|v| v.as_str()) {
        return Some(input.to_string());
    }
    if let Some(messages) = body.get("messages").and_then(|v| v.as_array()) {
        for message in messages.iter().rev() {
            if message.get("role").and_then(|v| v.as_str()) == Some("user") {
                if let Some(content) = message.get("content").and_then(|v| v.as_str()) {
                    return Some(content.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_prompt_field() {
        let body = json!({"prompt": "hi", "input": "bye"});
        assert_eq!(extract_prompt(&body), Some("hi".to_string()));
    }

    #[test]
    fn falls_back_to_input_field() {
        let body = json!({"input": "bye"});
        assert_eq!(extract_prompt(&body), Some("bye".to_string()));
    }

    #[test]
    fn falls_back_to_last_user_message() {
        let body = json!({
            "messages": [
                {"role": "system", "content": "be nice"},
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "ok"},
                {"role": "user", "content": "second"},
            ]
        });
        assert_eq!(extract_prompt(&body), Some("second".to_string()));
    }

    #[test]
    fn returns_none_when_nothing_recognized() {
        let body = json!({"foo": "bar"});
        assert_eq!(extract_prompt(&body), None);
    }
}
