//! `$EDITOR` round-trip for message editing.

use std::io::{BufRead, Write};
use std::process::Command;

use crate::error::UiError;

/// Open `$EDITOR` (or `$VISUAL`) on a temp file seeded with `initial` and
/// return the edited contents. Without an editor, fall back to an inline
/// multiline read terminated by a lone `.`; a blank edit keeps the
/// original text.
pub fn edit_in_editor(initial: &str) -> Result<String, UiError> {
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .ok()
        .filter(|e| !e.trim().is_empty());

    let Some(editor) = editor else {
        return read_inline(initial);
    };
    // A configured-but-missing editor should say so rather than fail with a
    // bare spawn error.
    if which::which(&editor).is_err() {
        return Err(UiError::EditorFailed {
            editor,
            status: "not found on PATH".to_string(),
        });
    }

    let mut tmp = tempfile::Builder::new()
        .prefix("quill-")
        .suffix(".txt")
        .tempfile()
        .map_err(UiError::Io)?;
    tmp.write_all(initial.as_bytes()).map_err(UiError::Io)?;
    tmp.flush().map_err(UiError::Io)?;

    let status = Command::new(&editor)
        .arg(tmp.path())
        .status()
        .map_err(UiError::Io)?;
    if !status.success() {
        return Err(UiError::EditorFailed {
            editor,
            status: status.to_string(),
        });
    }

    std::fs::read_to_string(tmp.path()).map_err(UiError::Io)
}

fn read_inline(initial: &str) -> Result<String, UiError> {
    println!("--- current ---");
    println!("{initial}");
    println!("----------------");
    println!("(Edit lines below; type '.' on its own line to finish)");

    let stdin = std::io::stdin();
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.map_err(UiError::Io)?;
        if line.trim() == "." {
            break;
        }
        lines.push(line);
    }

    let text = lines.join("\n");
    if text.trim().is_empty() {
        Ok(initial.to_string())
    } else {
        Ok(text)
    }
}
