//! Reading the actual state back from the remote service.

use crate::error::BoxError;
use std::future::Future;
use tidepool_model::{Policy, Project, Role, Table};

/// Failure to read remote state. "Not deployed yet" is not an error: the
/// fetch methods return `Ok(None)` for that.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Source of actual-state snapshots.
pub trait RemoteStateProvider {
    fn fetch_table(
        &self,
        schema: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<Table>, ProviderError>> + Send;

    fn fetch_role(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Role>, ProviderError>> + Send;

    fn fetch_policy(
        &self,
        schema: &str,
        table: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<Policy>, ProviderError>> + Send;

    /// Look up a hosted project. Only meaningful on the hosted platform.
    fn fetch_project(
        &self,
        project_id: &str,
    ) -> impl Future<Output = Result<Option<Project>, ProviderError>> + Send;
}
