//! Lifecycle reconciler for the `github_repository` resource.
//!
//! The host tool serializes transitions per resource: it never runs a second
//! transition on the same repository while one is outstanding. Every transition
//! is all-or-nothing. On error the caller's state record is left as it was, and
//! no partially decoded repository ever reaches it.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::client::GitHubClient;
use crate::error::{ClientError, ProviderError};
use crate::schema::{Attribute, Schema};
use crate::types::{RemoteRepository, RepositoryState};

/// The five transitions the host tool drives for a managed resource.
#[async_trait::async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// The state record of this resource type.
    type State: Send + 'static;

    /// Create the resource described by `planned` and return the new state.
    async fn create(
        &self,
        ctx: &CancellationToken,
        planned: Self::State,
    ) -> Result<Self::State, ProviderError>;

    /// Refresh `prior` from the remote side.
    ///
    /// `Ok(None)` signals that the resource no longer exists and its state
    /// should be removed.
    async fn read(
        &self,
        ctx: &CancellationToken,
        prior: Self::State,
    ) -> Result<Option<Self::State>, ProviderError>;

    /// Apply the in-place changes between `prior` and `planned`.
    async fn update(
        &self,
        ctx: &CancellationToken,
        prior: Self::State,
        planned: Self::State,
    ) -> Result<Self::State, ProviderError>;

    /// Delete the resource. On error the caller keeps `prior`.
    async fn delete(&self, ctx: &CancellationToken, prior: Self::State) -> Result<(), ProviderError>;

    /// Seed a minimal state from an external identifier. Performs no I/O.
    fn import_state(&self, id: &str) -> Result<Self::State, ProviderError>;
}

/// Reconciles [`RepositoryState`] records against the GitHub API.
#[derive(Debug, Clone)]
pub struct RepositoryResource {
    client: GitHubClient,
}

impl RepositoryResource {
    /// Create a reconciler backed by `client`.
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ResourceLifecycle for RepositoryResource {
    type State = RepositoryState;

    #[instrument(skip(self, ctx, planned), name = "repository.create", fields(name = %planned.name))]
    async fn create(
        &self,
        ctx: &CancellationToken,
        planned: RepositoryState,
    ) -> Result<RepositoryState, ProviderError> {
        let repo = self.client.create(ctx, &planned.create_directive()).await?;

        let mut state = planned;
        state.id = Some(repo.id.to_string());
        state.name = repo.name.clone();
        apply_settings(&mut state, &repo);
        state.full_name = Some(repo.full_name);
        state.owner = Some(repo.owner.login);

        info!(id = ?state.id, full_name = ?state.full_name, "Repository created");
        Ok(state)
    }

    #[instrument(skip(self, ctx, prior), name = "repository.read", fields(owner = ?prior.owner, name = %prior.name))]
    async fn read(
        &self,
        ctx: &CancellationToken,
        prior: RepositoryState,
    ) -> Result<Option<RepositoryState>, ProviderError> {
        let (owner, name) = prior.key()?;
        let repo = match self.client.get(ctx, owner, name).await {
            Ok(repo) => repo,
            Err(ClientError::NotFound) => {
                warn!("Repository no longer exists, removing from state");
                return Ok(None);
            },
            Err(e) => return Err(e.into()),
        };

        let mut state = prior;
        apply_settings(&mut state, &repo);
        state.full_name = Some(repo.full_name.clone());
        // The key fields are inputs here; only fill them when an import left them empty.
        if state.id.is_none() {
            state.id = Some(repo.id.to_string());
        }
        if state.owner.is_none() {
            state.owner = Some(repo.owner.login);
        }
        Ok(Some(state))
    }

    #[instrument(skip(self, ctx, prior, planned), name = "repository.update", fields(owner = ?prior.owner, name = %prior.name))]
    async fn update(
        &self,
        ctx: &CancellationToken,
        prior: RepositoryState,
        planned: RepositoryState,
    ) -> Result<RepositoryState, ProviderError> {
        if planned.name != prior.name {
            return Err(ProviderError::FailedPrecondition(format!(
                "repository name cannot change from '{}' to '{}' in place; it must be replaced",
                prior.name, planned.name
            )));
        }

        let (owner, name) = prior.key()?;
        let repo = self
            .client
            .update(ctx, owner, name, &planned.update_directive())
            .await?;

        let mut state = planned;
        state.id = prior.id.clone();
        state.full_name = prior.full_name.clone();
        state.owner = prior.owner.clone();
        apply_settings(&mut state, &repo);

        info!("Repository updated");
        Ok(state)
    }

    #[instrument(skip(self, ctx, prior), name = "repository.delete", fields(owner = ?prior.owner, name = %prior.name))]
    async fn delete(&self, ctx: &CancellationToken, prior: RepositoryState) -> Result<(), ProviderError> {
        let (owner, name) = prior.key()?;
        self.client.delete(ctx, owner, name).await?;

        info!("Repository deleted");
        Ok(())
    }

    fn import_state(&self, id: &str) -> Result<RepositoryState, ProviderError> {
        let (owner, name) = parse_import_id(id)?;

        let mut state = RepositoryState::new(name);
        state.owner = Some(owner.to_string());
        state.full_name = Some(format!("{}/{}", owner, name));
        Ok(state)
    }
}

/// Copy the observable settings of `repo` into `state`.
fn apply_settings(state: &mut RepositoryState, repo: &RemoteRepository) {
    state.description = repo.description.clone();
    state.private = repo.private;
    state.has_issues = repo.has_issues;
    state.has_wiki = repo.has_wiki;
}

/// Split an import identifier of the form `owner/name`.
pub fn parse_import_id(id: &str) -> Result<(&str, &str), ProviderError> {
    match id.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        },
        _ => Err(ProviderError::InvalidRequest(format!(
            "import id '{}' must have the form owner/name",
            id
        ))),
    }
}

/// Schema of the `github_repository` resource.
pub fn repository_schema() -> Schema {
    Schema::v0()
        .with_description("GitHub repository resource")
        .with_attribute(
            "id",
            Attribute::computed_string().with_description("Repository ID"),
        )
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_description("Repository name")
                .with_force_new(),
        )
        .with_attribute(
            "description",
            Attribute::optional_string().with_description("Repository description"),
        )
        .with_attribute(
            "private",
            Attribute::defaulted_bool(false).with_description("Whether the repository is private"),
        )
        .with_attribute(
            "has_issues",
            Attribute::defaulted_bool(true)
                .with_description("Whether to enable issues for the repository"),
        )
        .with_attribute(
            "has_wiki",
            Attribute::defaulted_bool(true)
                .with_description("Whether to enable wiki for the repository"),
        )
        .with_attribute(
            "auto_init",
            Attribute::defaulted_bool(false)
                .with_description("Whether to create an initial commit with empty README"),
        )
        .with_attribute(
            "full_name",
            Attribute::computed_string().with_description("Full name of the repository (owner/name)"),
        )
        .with_attribute(
            "owner",
            Attribute::computed_string().with_description("Repository owner"),
        )
}
