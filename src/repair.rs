//! Tolerant pre-processing for hand-edited JSON files.
//!
//! Settings files edited by hand often end up with a trailing comma before a
//! closing `}` or `]`, which strict parsers reject. [`strip_trailing_commas`]
//! removes those commas while leaving string contents alone.

/// Remove every comma that is followed, ignoring whitespace, by `}` or `]`.
///
/// Commas inside string literals are never touched, so a value such as
/// `"Team, Inc}"` survives. Runs of commas before a closer (`[1,,]`) are
/// dropped together, which keeps the function idempotent.
pub fn strip_trailing_commas(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut segment_start = 0;

    for (idx, &byte) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b',' if closes_after(&bytes[idx + 1..]) => {
                out.push_str(&input[segment_start..idx]);
                segment_start = idx + 1;
            }
            _ => {}
        }
    }

    out.push_str(&input[segment_start..]);
    out
}

/// Whether the next significant byte (skipping whitespace and further commas)
/// closes an object or array.
fn closes_after(rest: &[u8]) -> bool {
    rest.iter()
        .find(|b| !b.is_ascii_whitespace() && **b != b',')
        .is_some_and(|b| matches!(b, b'}' | b']'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_trailing_comma_in_object() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1,}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_removes_trailing_comma_across_whitespace() {
        let input = "{\n  \"env\": {\n    \"A\": \"1\",\n  },\n}\n";
        let repaired = strip_trailing_commas(input);
        assert_eq!(repaired, "{\n  \"env\": {\n    \"A\": \"1\"\n  }\n}\n");
        serde_json::from_str::<serde_json::Value>(&repaired).unwrap();
    }

    #[test]
    fn test_removes_trailing_comma_in_array() {
        assert_eq!(strip_trailing_commas("[1, 2, 3 , ]"), "[1, 2, 3  ]");
    }

    #[test]
    fn test_keeps_separating_commas() {
        let input = r#"{"a": [1, 2], "b": {"c": 3}}"#;
        assert_eq!(strip_trailing_commas(input), input);
    }

    #[test]
    fn test_ignores_commas_inside_strings() {
        let input = r#"{"display_name": "Team, Inc}", "x": "a,]"}"#;
        assert_eq!(strip_trailing_commas(input), input);
    }

    #[test]
    fn test_handles_escaped_quotes() {
        let input = r#"{"a": "say \"hi,\"}", "b": 1,}"#;
        assert_eq!(
            strip_trailing_commas(input),
            r#"{"a": "say \"hi,\"}", "b": 1}"#
        );
    }

    #[test]
    fn test_preserves_non_ascii_text() {
        let input = r#"{"name": "智谱 GLM", "emoji": "🚀",}"#;
        assert_eq!(
            strip_trailing_commas(input),
            r#"{"name": "智谱 GLM", "emoji": "🚀"}"#
        );
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "{}",
            r#"{"a": 1,}"#,
            "[1,,]",
            "[1,,2]",
            ",,}",
            r#"{"s": "x,}", "t": [",]",],}"#,
            r#"{"unterminated": "abc,}"#,
            "{\"a\": [1,\n\t],\n}",
        ];
        for sample in samples {
            let once = strip_trailing_commas(sample);
            let twice = strip_trailing_commas(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
