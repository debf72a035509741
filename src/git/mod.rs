//! Git collaborators: staged-diff collection and commit creation.
//!
//! The unit of work is the *staged* diff — quill never stages anything on
//! its own, and `commit_staged` commits the index exactly as the user left
//! it.

use git2::{Commit, DiffFormat, DiffOptions, ErrorCode, Oid, Repository, Tree};

use crate::error::GitError;

/// Open the repository at the current working directory.
pub fn open_repo() -> Result<Repository, GitError> {
    Repository::open(".").map_err(GitError::OpenRepository)
}

/// Patch text for everything staged (HEAD tree vs index), in plain
/// `git diff --staged` form with `--- a/` / `+++ b/` markers.
pub fn staged_diff(repo: &Repository) -> Result<String, GitError> {
    let head_tree = head_tree(repo)?;

    let mut opts = DiffOptions::new();
    opts.context_lines(3);

    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(GitError::DiffFailed)?;

    let mut buf = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => buf.push(line.origin()),
            _ => {}
        }
        buf.push_str(std::str::from_utf8(line.content()).unwrap_or(""));
        true
    })
    .map_err(GitError::DiffFailed)?;

    Ok(buf)
}

/// Commit whatever is staged with the given message. Fails with
/// `NoStagedChanges` when the index matches HEAD.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid, GitError> {
    let mut index = repo.index().map_err(GitError::CommitFailed)?;
    let tree_id = index.write_tree().map_err(GitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(GitError::CommitFailed)?;

    let sig = repo.signature().map_err(GitError::Signature)?;

    let parent = head_commit(repo)?;
    if let Some(ref p) = parent
        && p.tree_id() == tree_id
    {
        return Err(GitError::NoStagedChanges);
    }
    let parents: Vec<&Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(GitError::CommitFailed)
}

/// HEAD's tree, or None on an unborn branch (first commit).
fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    match repo.head() {
        Ok(head) => head
            .peel_to_tree()
            .map(Some)
            .map_err(GitError::DiffFailed),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(GitError::DiffFailed(e)),
    }
}

fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, GitError> {
    match repo.head() {
        Ok(head) => head
            .peel_to_commit()
            .map(Some)
            .map_err(GitError::CommitFailed),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(GitError::CommitFailed(e)),
    }
}
