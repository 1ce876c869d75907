//! Hemmer provider for GitHub repositories
//!
//! This crate manages a single resource type, `github_repository`, on behalf of
//! the Hemmer provisioning tool. It has two layers:
//!
//! - **[`client`]**: a stateless client for the GitHub REST repositories API.
//!   One operation is one HTTP round-trip with a classified result.
//! - **[`resource`]**: the lifecycle reconciler mapping create, read, update,
//!   delete and import onto client calls and state records.
//!
//! [`provider`] exposes both to the host tool through [`ProviderService`], which
//! exchanges JSON state records keyed by resource type.
//!
//! # Quick Start
//!
//! ```ignore
//! use hemmer_provider_github::{init_logging, GitHubProvider, ProviderService};
//! use tokio_util::sync::CancellationToken;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = GitHubProvider::new();
//!     provider.configure(json!({"token": std::env::var("GITHUB_TOKEN")?})).await?;
//!
//!     let ctx = CancellationToken::new();
//!     let state = provider
//!         .create(&ctx, "github_repository", json!({"name": "demo", "private": true}))
//!         .await?;
//!     println!("created {}", state["full_name"]);
//!     Ok(())
//! }
//! ```
//!
//! # Reconciliation Rules
//!
//! - `name` forces replacement; [`ResourceLifecycle::update`] refuses renames.
//! - A read that finds the repository gone returns `None`, telling the host
//!   tool to drop the resource from state.
//! - A failed delete leaves the state in place so it can be retried.
//! - Import takes `owner/name` and performs no network I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::GitHubClient;
pub use config::ProviderConfig;
pub use error::{ClientError, ProviderError, TransportError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{GitHubProvider, ProviderService};
pub use resource::{RepositoryResource, ResourceLifecycle};
pub use schema::{Diagnostic, ProviderSchema};
pub use types::{
    CreateRepository, ImportedResource, RemoteRepository, RepositoryState, UpdateRepository,
    REPOSITORY_RESOURCE,
};
pub use validation::validate;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tokio_util::sync::CancellationToken;
pub use tracing;
