use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The authenticated identity as downstream code sees it. Owned by the
/// resolver; the gate only ever holds a request-scoped copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    /// Authority labels with set semantics: order irrelevant, duplicates collapse.
    #[serde(default)]
    pub authorities: BTreeSet<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl Principal {
    pub fn new<S: Into<String>>(username: S, authorities: impl IntoIterator<Item = S>) -> Self {
        Self {
            username: username.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}
