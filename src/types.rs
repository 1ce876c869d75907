//! Wire records for the repositories API and the state record kept by the host tool.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Resource type name of the managed repository.
pub const REPOSITORY_RESOURCE: &str = "github_repository";

/// A repository as reported by GitHub.
///
/// Only the fields this provider reconciles are decoded; the rest of the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepository {
    /// Server-assigned identifier.
    pub id: u64,
    /// Repository name, unique within the owner.
    pub name: String,
    /// `owner/name`, derived by the server.
    pub full_name: String,
    /// Free-form description; GitHub reports `null` when unset.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the repository is private.
    pub private: bool,
    /// Whether the issue tracker is enabled.
    pub has_issues: bool,
    /// Whether the wiki is enabled.
    pub has_wiki: bool,
    /// The owning account.
    pub owner: RepositoryOwner,
}

impl RemoteRepository {
    /// `owner.login + "/" + name`.
    pub fn derived_full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

/// The account owning a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryOwner {
    /// Login name of the account.
    pub login: String,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct CreateRepository {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
    pub has_issues: bool,
    pub has_wiki: bool,
    /// Create an initial commit with an empty README.
    pub auto_init: bool,
}

/// Body of `PATCH /repos/{owner}/{name}`.
///
/// Has no `name` field; renames go through destroy and recreate.
/// `description` is always sent, so an empty string clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct UpdateRepository {
    pub description: String,
    pub private: bool,
    pub has_issues: bool,
    pub has_wiki: bool,
}

/// The `github_repository` state record owned by the host tool.
///
/// Defaults mirror the schema defaults so a sparse planned state decodes to
/// the same record the host tool would have produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RepositoryState {
    /// Server-assigned identifier, fixed once created.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default = "default_true")]
    pub has_issues: bool,
    #[serde(default = "default_true")]
    pub has_wiki: bool,
    /// Create-time directive; never observed back from the API.
    #[serde(default)]
    pub auto_init: bool,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Login of the owning account, known after create or import.
    #[serde(default)]
    pub owner: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RepositoryState {
    /// A planned state with the schema defaults for everything but the name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            private: false,
            has_issues: true,
            has_wiki: true,
            auto_init: false,
            full_name: None,
            owner: None,
        }
    }

    /// The `(owner, name)` pair used to address the repository.
    pub fn key(&self) -> Result<(&str, &str), ProviderError> {
        match self.owner.as_deref() {
            Some(owner) if !owner.is_empty() => Ok((owner, &self.name)),
            _ => Err(ProviderError::InvalidRequest(format!(
                "owner of repository '{}' is unknown; it has not been created or imported",
                self.name
            ))),
        }
    }

    /// The create directive for this planned state.
    pub fn create_directive(&self) -> CreateRepository {
        CreateRepository {
            name: self.name.clone(),
            description: self.description.clone(),
            private: self.private,
            has_issues: self.has_issues,
            has_wiki: self.has_wiki,
            auto_init: self.auto_init,
        }
    }

    /// The update directive for this planned state.
    pub fn update_directive(&self) -> UpdateRepository {
        UpdateRepository {
            description: self.description.clone().unwrap_or_default(),
            private: self.private,
            has_issues: self.has_issues,
            has_wiki: self.has_wiki,
        }
    }

    /// Decode a state record handed over by the host tool.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode this record for the host tool.
    pub fn to_value(&self) -> Result<serde_json::Value, ProviderError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}
