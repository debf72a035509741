//! Prompt construction for AI-generated commit messages.

/// Everything a generation attempt needs; built once per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    /// Sanitized diff text — the only diff form ever sent to a backend.
    pub diff: String,
    /// Allowed Conventional Commit types, in presentation order.
    pub types: Vec<String>,
    pub max_title: usize,
    pub max_body: usize,
    /// Optional user-requested type (`--type`).
    pub type_hint: Option<String>,
}

/// Render the generation instruction. Deterministic: identical specs render
/// identical prompts — tests rely on this.
pub fn build_prompt(spec: &PromptSpec) -> String {
    let type_list = spec.types.join(", ");
    let hint = match spec.type_hint.as_deref() {
        Some(t) if !t.is_empty() => format!("\nUser-specified type hint: {t}"),
        _ => String::new(),
    };

    format!(
        r#"Generate a Conventional Commit message from the following staged git diff.
Constraints:
- title <= {max_title} characters
- optional body lines <= {max_body} columns
- types allowed: {type_list}
Output format:
- First line: "<type>(optional scope): <title>"
- Optional body: wrapped to {max_body} columns.
- Output ONLY the commit message. No steps, no tables, no quotes, no extra text.
- Do not include code fences, backticks, or explanations.
{hint}
Diff:
{diff}
"#,
        max_title = spec.max_title,
        max_body = spec.max_body,
        diff = spec.diff,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ALLOWED_TYPES, MAX_BODY_LINE_LEN, MAX_TITLE_LEN};

    fn spec(diff: &str, hint: Option<&str>) -> PromptSpec {
        PromptSpec {
            diff: diff.to_string(),
            types: ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
            max_title: MAX_TITLE_LEN,
            max_body: MAX_BODY_LINE_LEN,
            type_hint: hint.map(|h| h.to_string()),
        }
    }

    #[test]
    fn test_prompt_contains_constraints_and_diff() {
        let prompt = build_prompt(&spec("+fn new_function() {}\n", None));
        assert!(prompt.contains("title <= 72 characters"));
        assert!(prompt.contains("body lines <= 100 columns"));
        assert!(prompt.contains("feat, fix, refactor, docs, chore, style, test, perf"));
        assert!(prompt.contains("+fn new_function() {}"));
        assert!(prompt.contains("Output ONLY the commit message"));
    }

    #[test]
    fn test_prompt_includes_hint_only_when_set() {
        let with = build_prompt(&spec("+x\n", Some("fix")));
        assert!(with.contains("User-specified type hint: fix"));

        let without = build_prompt(&spec("+x\n", None));
        assert!(!without.contains("type hint"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt(&spec("+same\n", Some("feat")));
        let b = build_prompt(&spec("+same\n", Some("feat")));
        assert_eq!(a, b);
    }
}
