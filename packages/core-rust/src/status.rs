use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status word reported by an action routine.
///
/// Rendered lowercase so it reads naturally inside event narratives
/// (`"NSM service mesh installed successfully"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Deploying,
    Deployed,
    Installing,
    Installed,
    Removing,
    Removed,
    Running,
    Completed,
}

impl Status {
    /// Returns the canonical lowercase word.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deploying => "deploying",
            Self::Deployed => "deployed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Removing => "removing",
            Self::Removed => "removed",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    /// In-progress word for an install-style action.
    #[must_use]
    pub fn installing(delete: bool) -> Self {
        if delete {
            Self::Removing
        } else {
            Self::Installing
        }
    }

    /// Terminal word for a successful install-style action.
    #[must_use]
    pub fn installed(delete: bool) -> Self {
        if delete {
            Self::Removed
        } else {
            Self::Installed
        }
    }

    /// In-progress word for a deploy-style action (manifests, sample apps).
    #[must_use]
    pub fn deploying(delete: bool) -> Self {
        if delete {
            Self::Removing
        } else {
            Self::Deploying
        }
    }

    /// Terminal word for a successful deploy-style action.
    #[must_use]
    pub fn deployed(delete: bool) -> Self {
        if delete {
            Self::Removed
        } else {
            Self::Deployed
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_lowercase_word() {
        assert_eq!(Status::Installed.to_string(), "installed");
        assert_eq!(Status::Completed.to_string(), "completed");
    }

    #[test]
    fn delete_flag_selects_removal_words() {
        assert_eq!(Status::installing(false), Status::Installing);
        assert_eq!(Status::installing(true), Status::Removing);
        assert_eq!(Status::installed(true), Status::Removed);
        assert_eq!(Status::deploying(false), Status::Deploying);
        assert_eq!(Status::deployed(false), Status::Deployed);
        assert_eq!(Status::deployed(true), Status::Removed);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Status::Deploying).unwrap();
        assert_eq!(json, "\"deploying\"");
    }
}
