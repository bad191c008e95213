use serde::{Deserialize, Serialize};
use std::fmt;

const GLOBAL_SESSION: &str = "global";

/// Identifies the caller whose frames share temporal state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            return Self::global();
        }
        Self(id)
    }

    /// The shared session used when a caller does not identify itself
    pub fn global() -> Self {
        Self(GLOBAL_SESSION.to_string())
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_SESSION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Option<String>> for SessionId {
    fn from(id: Option<String>) -> Self {
        id.map(SessionId::new).unwrap_or_default()
    }
}
