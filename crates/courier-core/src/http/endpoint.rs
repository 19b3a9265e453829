//! Public/private endpoint routing
//!
//! A path is public when it contains any configured fragment as a substring.
//! Matching is case-sensitive and performs no normalisation, so fragments
//! must be written exactly as the routes appear.

/// Ordered, read-only set of public path fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicEndpoints {
    fragments: Vec<String>,
}

impl PublicEndpoints {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `path` needs no credential
    pub fn is_public(&self, path: &str) -> bool {
        self.fragments
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}
