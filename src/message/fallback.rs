//! Deterministic fallback composer: a commit message from diff statistics,
//! used when generation fails or returns nothing usable.

use crate::message::CommitMessage;

/// Compose `chore: update <files>` plus an addition/deletion summary from
/// the raw diff. Pure and total — this is the pipeline's guaranteed
/// terminal output producer.
pub fn fallback_from_diff(diff: &str, max_title: usize) -> CommitMessage {
    let stats = count_diff_stats(diff);

    let files = if stats.files.is_empty() {
        vec!["files".to_string()]
    } else {
        stats.files
    };

    let mut title = format!("chore: update {}", files.join(", "));
    if title.len() > max_title {
        let mut end = max_title;
        while end > 0 && !title.is_char_boundary(end) {
            end -= 1;
        }
        title.truncate(end);
    }

    let mut body_lines = Vec::new();
    if stats.added > 0 {
        body_lines.push(format!("- Additions: {}", stats.added));
    }
    if stats.removed > 0 {
        body_lines.push(format!("- Deletions: {}", stats.removed));
    }

    if body_lines.is_empty() {
        CommitMessage::title_only(title)
    } else {
        CommitMessage {
            title,
            body: Some(body_lines.join("\n")),
        }
    }
}

struct DiffStats {
    added: usize,
    removed: usize,
    files: Vec<String>,
}

/// Line-oriented scan for `+++ b/` / `--- a/` path markers (deduplicated,
/// order preserved) and added/removed line counts.
fn count_diff_stats(diff: &str) -> DiffStats {
    let mut stats = DiffStats {
        added: 0,
        removed: 0,
        files: Vec::new(),
    };

    for line in diff.lines() {
        let marker = line
            .strip_prefix("+++ b/")
            .or_else(|| line.strip_prefix("--- a/"));
        if let Some(name) = marker {
            if !name.is_empty()
                && name != "/dev/null"
                && !stats.files.iter().any(|f| f == name)
            {
                stats.files.push(name.to_string());
            }
        }
        if line.starts_with('+') && !line.starts_with("+++") {
            stats.added += 1;
        }
        if line.starts_with('-') && !line.starts_with("---") {
            stats.removed += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MAX_TITLE_LEN;

    const SAMPLE: &str = "\
diff --git a/a.go b/a.go
--- a/a.go
+++ b/a.go
@@ -1,2 +1,4 @@
+added one
+added two
-removed one
diff --git a/b.go b/b.go
--- a/b.go
+++ b/b.go
@@ -0,0 +1,1 @@
+added three
";

    #[test]
    fn test_fallback_composes_title_and_counts() {
        let msg = fallback_from_diff(SAMPLE, MAX_TITLE_LEN);
        assert_eq!(msg.title, "chore: update a.go, b.go");
        let body = msg.body.expect("body with counts");
        assert!(body.contains("Additions: 3"));
        assert!(body.contains("Deletions: 1"));
    }

    #[test]
    fn test_fallback_empty_diff() {
        let msg = fallback_from_diff("", MAX_TITLE_LEN);
        assert_eq!(msg.title, "chore: update files");
        assert!(msg.body.is_none());
    }

    #[test]
    fn test_fallback_skips_dev_null() {
        let diff = "--- a/old.rs\n+++ b/new.rs\n--- a//dev/null\n";
        let msg = fallback_from_diff(diff, MAX_TITLE_LEN);
        assert_eq!(msg.title, "chore: update old.rs, new.rs");
    }

    #[test]
    fn test_fallback_title_truncated() {
        let mut diff = String::new();
        for i in 0..30 {
            diff.push_str(&format!("+++ b/some/long/path/module_{i}.rs\n"));
        }
        let msg = fallback_from_diff(&diff, MAX_TITLE_LEN);
        assert!(msg.title.len() <= MAX_TITLE_LEN);
    }

    #[test]
    fn test_fallback_dedupes_paths_in_order() {
        let diff = "--- a/z.rs\n+++ b/z.rs\n--- a/a.rs\n+++ b/a.rs\n";
        let msg = fallback_from_diff(diff, MAX_TITLE_LEN);
        assert_eq!(msg.title, "chore: update z.rs, a.rs");
    }
}
