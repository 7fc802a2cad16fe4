//! Pulls a JSON object out of free-form model output.

/// Return the first balanced `{ ... }` object embedded in `text`.
///
/// Models tend to wrap JSON in prose or code fences. Braces inside string
/// literals are ignored, and `None` is returned when no object closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_inside_code_fence() {
        let text = "Sure!\n```json\n{\"mode\": \"game\", \"apis\": []}\n```";
        assert_eq!(
            extract_json_object(text),
            Some("{\"mode\": \"game\", \"apis\": []}")
        );
    }

    #[test]
    fn nested_objects_and_braces_in_strings() {
        let text = r#"x {"a": {"b": "}"}, "c": "{"} trailing }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"a": {"b": "}"}, "c": "{"}"#)
        );
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let text = r#"{"q": "say \"}\" loud"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn unbalanced_or_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"mode\": \"chat\""), None);
    }
}
