use crate::error::*;
use regex::Regex;
use std::fmt;

/// Qualified name of a repository, `{namespace}/{repository}`
///
/// Quay addresses repositories by a slash-delimited path whose last
/// segment is the repository and whose leading segments form the
/// namespace, which may itself contain slashes:
///
/// ```
/// use quaykeep::RepoName;
///
/// let name = RepoName::parse("org/sub/repo").unwrap();
/// assert_eq!(name.namespace, "org/sub");
/// assert_eq!(name.repository, "repo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub namespace: String,
    pub repository: String,
}

lazy_static::lazy_static! {
    static ref NAME_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*(/[a-zA-Z0-9][a-zA-Z0-9._-]*)*$").unwrap();
}

impl RepoName {
    pub fn parse(name: &str) -> Result<Self> {
        if !NAME_RE.is_match(name) {
            return Err(Error::InvalidRepoName(name.to_string()));
        }
        let (namespace, repository) = match name.rsplit_once('/') {
            Some((namespace, repository)) => (namespace.to_string(), repository.to_string()),
            None => (String::new(), name.to_string()),
        };
        Ok(RepoName {
            namespace,
            repository,
        })
    }

    /// Build a name from independently supplied parts.
    pub fn from_parts(namespace: &str, repository: &str) -> Result<Self> {
        if namespace.is_empty() {
            return Self::parse(repository);
        }
        Self::parse(&format!("{}/{}", namespace, repository))
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.repository)
        } else {
            write!(f, "{}/{}", self.namespace, self.repository)
        }
    }
}
