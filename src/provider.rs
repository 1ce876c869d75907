//! The provider surface the host tool talks to.
//!
//! The host tool exchanges state records as JSON values keyed by resource type.
//! [`ProviderService`] is that surface; [`GitHubProvider`] implements it by
//! decoding the records and handing them to [`RepositoryResource`].

use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::GitHubClient;
use crate::config::{provider_config_schema, ProviderConfig};
use crate::error::ProviderError;
use crate::resource::{repository_schema, RepositoryResource, ResourceLifecycle};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, RepositoryState, REPOSITORY_RESOURCE};
use crate::validation::{validate, validate_repository_name};

/// Trait a provider implements for the host tool.
///
/// # Example
///
/// ```ignore
/// use hemmer_provider_github::{GitHubProvider, ProviderService};
/// use tokio_util::sync::CancellationToken;
///
/// let provider = GitHubProvider::new();
/// provider.configure(serde_json::json!({"token": "ghp_..."})).await?;
/// let state = provider
///     .create(&CancellationToken::new(), "github_repository", serde_json::json!({"name": "demo"}))
///     .await?;
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Provider Lifecycle
    // =========================================================================

    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Create a new resource.
    async fn create(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource; `None` means it is gone.
    async fn read(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::UnknownResource(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// The GitHub provider.
///
/// Holds the API client built by [`ProviderService::configure`]; resource
/// operations fail with [`ProviderError::Configuration`] until then.
#[derive(Debug, Default)]
pub struct GitHubProvider {
    client: RwLock<Option<GitHubClient>>,
}

impl GitHubProvider {
    /// Create an unconfigured provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that is already configured with `client`.
    pub fn with_client(client: GitHubClient) -> Self {
        Self {
            client: RwLock::new(Some(client)),
        }
    }

    async fn repositories(&self, resource_type: &str) -> Result<RepositoryResource, ProviderError> {
        if resource_type != REPOSITORY_RESOURCE {
            return Err(ProviderError::UnknownResource(resource_type.to_string()));
        }
        let client = self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })?;
        Ok(RepositoryResource::new(client))
    }

    fn check_planned(planned: &Value) -> Result<RepositoryState, ProviderError> {
        let mut diagnostics = validate(&repository_schema(), planned);
        if let Some(name) = planned.get("name").and_then(Value::as_str) {
            diagnostics.extend(validate_repository_name(name));
        }
        if !diagnostics.is_empty() {
            return Err(ProviderError::Validation(summarize(&diagnostics)));
        }
        RepositoryState::from_value(planned.clone())
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.detail {
            Some(detail) => format!("{}: {}", d.summary, detail),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait::async_trait]
impl ProviderService for GitHubProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(provider_config_schema())
            .with_resource(REPOSITORY_RESOURCE, repository_schema())
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(ProviderConfig::from_value(config)?.validate())
    }

    #[instrument(skip(self, config), name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        let diagnostics = config.validate();
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
            return Ok(diagnostics);
        }

        debug!(base_url = %config.base_url, timeout = ?config.timeout(), "Building GitHub client");
        let client = GitHubClient::new(config)?;
        *self.client.write().await = Some(client);

        info!("Configure completed successfully");
        Ok(diagnostics)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        if resource_type != REPOSITORY_RESOURCE {
            return Err(ProviderError::UnknownResource(resource_type.to_string()));
        }
        let mut diagnostics = validate(&repository_schema(), &config);
        if let Some(name) = config.get("name").and_then(Value::as_str) {
            diagnostics.extend(validate_repository_name(name));
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, ctx, planned_state), name = "provider.create")]
    async fn create(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.repositories(resource_type).await?;
        let planned = Self::check_planned(&planned_state)?;

        match resource.create(ctx, planned).await {
            Ok(state) => state.to_value(),
            Err(e) => {
                error!(error = %e, "Create failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, ctx, current_state), name = "provider.read")]
    async fn read(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let resource = self.repositories(resource_type).await?;
        let prior = RepositoryState::from_value(current_state)?;

        match resource.read(ctx, prior).await {
            Ok(Some(state)) => Ok(Some(state.to_value()?)),
            Ok(None) => Ok(None),
            Err(e) => {
                error!(error = %e, "Read failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, ctx, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.repositories(resource_type).await?;
        let prior = RepositoryState::from_value(prior_state)?;
        let planned = Self::check_planned(&planned_state)?;

        match resource.update(ctx, prior, planned).await {
            Ok(state) => state.to_value(),
            Err(e) => {
                error!(error = %e, "Update failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, ctx, current_state), name = "provider.delete")]
    async fn delete(
        &self,
        ctx: &CancellationToken,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let resource = self.repositories(resource_type).await?;
        let prior = RepositoryState::from_value(current_state)?;

        resource.delete(ctx, prior).await.inspect_err(|e| {
            error!(error = %e, "Delete failed");
        })
    }

    #[instrument(skip(self), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.repositories(resource_type).await?;
        let state = resource.import_state(id)?;

        info!("Import seeded state; the next read populates it");
        Ok(vec![ImportedResource::new(resource_type, state.to_value()?)])
    }
}
