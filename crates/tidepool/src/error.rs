use crate::change::{ColumnChangeKind, RelationChangeKind};
use crate::execute::ApplyError;
use crate::remote::ProviderError;
use thiserror::Error;
use tidepool_config::{Capability, ConfigError, DeploymentTarget};

/// Boxed error used at the executor and provider seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{capability} is not supported for {target} deployments")]
    UnsupportedInMode {
        capability: Capability,
        target: DeploymentTarget,
    },

    #[error("remote state error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("schema {schema:?} is not one of the configured schemas")]
    UnmanagedSchema { schema: String },

    #[error("project {id:?} not found")]
    ProjectNotFound { id: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A change request that cannot be turned into a plan.
///
/// Returned before any operation is produced; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("table name must not be empty")]
    EmptyTableName,

    #[error("column {column:?} appears more than once in table {table:?}")]
    DuplicateColumn { table: String, column: String },

    #[error("table {table:?} declares {count} primary keys, at most one is allowed")]
    MultiplePrimaryKeys { table: String, count: usize },

    #[error("column {column:?} exists in neither the actual nor the desired table {table:?}")]
    UnknownColumn { table: String, column: String },

    #[error("column {column:?} cannot be both `{first}` and `{second}`")]
    ConflictingColumnKinds {
        column: String,
        first: ColumnChangeKind,
        second: ColumnChangeKind,
    },

    #[error(
        "column {column:?} is not declared in table {table:?}, only `delete` applies to it (got `{kind}`)"
    )]
    UndeclaredColumn {
        table: String,
        column: String,
        kind: ColumnChangeKind,
    },

    #[error("column {column:?} is marked `new` but the desired table does not define it")]
    MissingColumnDefinition { column: String },

    #[error("primary key {name:?} must cover at least one column")]
    PrimaryKeyWithoutColumns { name: String },

    #[error("primary key {name:?} references unknown column {column:?}")]
    UnknownPrimaryKeyColumn { name: String, column: String },

    #[error(
        "primary key {name:?} covers column {column:?}, which is not deployed yet; add the column first"
    )]
    PrimaryKeyOnNewColumn { name: String, column: String },

    #[error("relationship {constraint:?} has no index to create")]
    MissingIndex { constraint: String },

    #[error("relationship {constraint:?} has no actions for `{kind}`")]
    MissingAction {
        constraint: String,
        kind: RelationChangeKind,
    },

    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("role {role:?} has connection limit {limit}, expected -1 or more")]
    InvalidConnectionLimit { role: String, limit: i32 },

    #[error("policy name must not be empty")]
    EmptyPolicyName,

    #[error("the name of the policy to change must not be empty")]
    EmptyPolicyTarget,

    #[error("policy {policy:?} is not attached to a table")]
    EmptyPolicyTable { policy: String },
}
