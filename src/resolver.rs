//! Turns a free-form command string into a repository reference and a
//! release tag request.
//!
//! Accepted shapes, checked in order:
//! 1. a GitHub release URL (`https://github.com/{owner}/{repo}/releases/tag/{tag}`)
//! 2. `shortcut-or-owner/repo:tag`
//! 3. `shortcut-or-owner/repo tag`
//! 4. bare `shortcut-or-owner/repo` (tag request = latest)

use crate::error::{Error, Result};
use crate::models::{ReleaseTagRequest, RepositoryRef, Shortcuts};

pub fn resolve(
    command: &str,
    shortcuts: &Shortcuts,
) -> Result<(RepositoryRef, ReleaseTagRequest)> {
    let command = command.trim();
    if command.is_empty() {
        return Err(Error::UnknownRepository(command.to_string()));
    }

    // Release URLs contain ':' so they must be recognized before the colon rule.
    if let Some((repo_part, tag)) = parse_release_url(command) {
        let repo = RepositoryRef::parse(&repo_part)?;
        return Ok((repo, ReleaseTagRequest::Tag(tag)));
    }

    if let Some((left, right)) = command.split_once(':') {
        let repo = lookup(left.trim(), shortcuts)?;
        return Ok((repo, ReleaseTagRequest::Tag(right.trim().to_string())));
    }

    if let Some((left, right)) = command.split_once(' ') {
        let repo = lookup(left.trim(), shortcuts)?;
        return Ok((repo, ReleaseTagRequest::Tag(right.trim().to_string())));
    }

    let repo = lookup(command, shortcuts)?;
    Ok((repo, ReleaseTagRequest::Latest))
}

/// Serializes a resolved pair back into the canonical `owner/repo[:tag]`
/// command form.
pub fn canonical_command(repo: &RepositoryRef, request: &ReleaseTagRequest) -> String {
    match request {
        ReleaseTagRequest::Latest => repo.full_name(),
        ReleaseTagRequest::Tag(tag) => format!("{}:{}", repo.full_name(), tag),
    }
}

fn lookup(segment: &str, shortcuts: &Shortcuts) -> Result<RepositoryRef> {
    if let Some(repo) = shortcuts.get(segment) {
        return Ok(repo.clone());
    }
    RepositoryRef::parse(segment)
}

fn parse_release_url(command: &str) -> Option<(String, String)> {
    let idx = command.find("github.com/")?;
    let rest = &command[idx + "github.com/".len()..];
    let (repo_part, tag_part) = rest.split_once("/releases/tag/")?;
    let tag: String = tag_part
        .chars()
        .take_while(|c| !matches!(c, '/' | '?' | '#'))
        .collect();
    if repo_part.is_empty() || tag.is_empty() {
        return None;
    }
    Some((repo_part.to_string(), tag))
}
