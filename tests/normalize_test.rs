//! Integration tests for commit-message normalization invariants.

use proptest::prelude::*;
use regex_lite::Regex;

use quill::message::{
    ALLOWED_TYPES, MAX_BODY_LINE_LEN, MAX_TITLE_LEN, NormalizeOptions, normalize,
};

fn opts() -> NormalizeOptions {
    NormalizeOptions::default()
}

fn leading_type_of(title: &str) -> Option<String> {
    let re = Regex::new(r"^([A-Za-z]+)(\([^)]*\))?:").unwrap();
    re.captures(title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}

#[test]
fn blank_input_yields_default_update() {
    assert_eq!(normalize("", &opts()).render(), "chore: update");
    assert_eq!(normalize(" \n\t ", &opts()).render(), "chore: update");
}

#[test]
fn fenced_title_with_trailing_table_is_cleaned() {
    // A backend wrapped everything in a fence and appended a markdown table.
    let raw = "\
Here is the commit message:
feat(core): add request tracing

Explains why tracing was added.

| file | change |
|------|--------|
| a.rs | +10    |
";
    let msg = normalize(raw, &opts());
    assert_eq!(msg.title, "feat(core): add request tracing");
    let body = msg.body.expect("body survives");
    assert!(body.contains("Explains why tracing was added."));
    assert!(!body.contains('|'));
}

#[test]
fn fence_block_is_removed_entirely() {
    let raw = "```text\nnot the message\n```\nfix: the real title";
    let msg = normalize(raw, &opts());
    assert_eq!(msg.title, "fix: the real title");
}

#[test]
fn unknown_type_gets_default_prefix() {
    let msg = normalize("added a new parser", &opts());
    assert_eq!(msg.title, "chore: added a new parser");
}

#[test]
fn type_hint_becomes_default_type() {
    let custom = NormalizeOptions {
        default_type: "fix".to_string(),
        ..opts()
    };
    let msg = normalize("resolve crash on empty input", &custom);
    assert_eq!(msg.title, "fix: resolve crash on empty input");
}

proptest! {
    /// Whatever a backend returns, the result obeys the length invariants
    /// and carries an accepted leading type whenever a title grammar is
    /// still parseable.
    #[test]
    fn normalize_output_obeys_invariants(raw in "[ -~\\n]{0,400}") {
        let msg = normalize(&raw, &opts());

        prop_assert!(!msg.title.is_empty());
        prop_assert!(msg.title.len() <= MAX_TITLE_LEN);
        if let Some(body) = &msg.body {
            for line in body.split('\n') {
                prop_assert!(line.len() <= MAX_BODY_LINE_LEN, "long line: {line:?}");
            }
        }
        if let Some(ty) = leading_type_of(&msg.title) {
            prop_assert!(
                ALLOWED_TYPES.iter().any(|t| *t == ty),
                "unexpected type {ty:?} in {:?}",
                msg.title
            );
        }
    }

    /// Fences and tables around a valid message never leak into the output.
    #[test]
    fn normalize_strips_fences_and_tables(
        noise in "[a-z ]{0,40}",
        subject in "[a-z]([a-z ]{0,28}[a-z])?",
    ) {
        let raw = format!(
            "```\n{noise}\n```\nfeat: {subject}\n| a | b |\n| 1 | 2 |\n"
        );
        let msg = normalize(&raw, &opts());
        prop_assert_eq!(msg.title, format!("feat: {}", subject));
        prop_assert!(msg.body.is_none());
    }

    /// Normalization is idempotent on its own rendered output. Parentheses
    /// are excluded: hard truncation may cut through a long `(scope)` and
    /// change how the title re-parses.
    #[test]
    fn normalize_is_idempotent_on_rendered_output(raw in "[ -'*-~\\n]{0,300}") {
        let first = normalize(&raw, &opts());
        let second = normalize(&first.render(), &opts());
        prop_assert_eq!(first.title, second.title);
    }
}
