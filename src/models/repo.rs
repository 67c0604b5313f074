use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Canonical `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// Parses `owner/repo`. Both segments must be non-empty and free of
    /// whitespace; anything else is an unknown repository.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();

        let valid = |seg: &str| !seg.is_empty() && !seg.contains(char::is_whitespace);
        if !valid(owner) || !valid(name) || name.contains('/') {
            return Err(Error::UnknownRepository(s.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What the user asked for: a concrete tag, or whatever the latest
/// published release turns out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseTagRequest {
    Latest,
    Tag(String),
}

impl ReleaseTagRequest {
    pub fn as_str(&self) -> &str {
        match self {
            ReleaseTagRequest::Latest => "latest",
            ReleaseTagRequest::Tag(tag) => tag,
        }
    }
}

/// Immutable shortcut table injected at agent construction.
#[derive(Debug, Clone, Default)]
pub struct Shortcuts {
    entries: BTreeMap<String, RepositoryRef>,
}

impl Shortcuts {
    pub fn new(entries: BTreeMap<String, RepositoryRef>) -> Self {
        Self { entries }
    }

    /// The Prebid repositories this tool grew up around.
    pub fn prebid() -> Self {
        let mut entries = BTreeMap::new();
        for (shortcut, full) in [
            ("js", "prebid/Prebid.js"),
            ("server", "prebid/prebid-server"),
            ("server-java", "prebid/prebid-server-java"),
            ("ios", "prebid/prebid-mobile-ios"),
            ("android", "prebid/prebid-mobile-android"),
        ] {
            let repo = RepositoryRef::parse(full).expect("static shortcut table");
            entries.insert(shortcut.to_string(), repo);
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&RepositoryRef> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepositoryRef)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
