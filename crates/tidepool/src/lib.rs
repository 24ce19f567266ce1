//! tidepool - reconcile declared Postgres objects against deployed ones.
//!
//! Given a desired table, role or policy, the deployed version of it, and a
//! list of the kinds of change the caller cares about, the planner produces
//! an ordered [`Plan`] of typed operations. Planning is pure: no I/O, no
//! mutation of its inputs, and the only failure is a [`ValidationError`].
//!
//! ```
//! use tidepool::{ColumnChange, ColumnChangeKind, TableChangeKind, TableChangeRequest};
//! use tidepool_model::{Column, Table};
//!
//! let mut old = Table::new("public", "post");
//! old.columns = vec![Column::new("title", "varchar(80)")];
//!
//! let mut desired = Table::new("public", "post");
//! desired.columns = vec![Column::new("title", "text").not_null()];
//! desired.rls_enabled = true;
//!
//! let request = TableChangeRequest::new(old)
//!     .table_change(TableChangeKind::RlsEnable)
//!     .column(ColumnChange::new(
//!         "title",
//!         [ColumnChangeKind::DataType, ColumnChangeKind::Nullable],
//!     ));
//!
//! let plan = tidepool::plan_table_changes(&desired, &request).unwrap();
//! assert_eq!(plan.len(), 2);
//! ```
//!
//! Applying a plan is someone else's job: see [`PlanExecutor`] and
//! [`Reconciler`], which also fetches the deployed state through a
//! [`RemoteStateProvider`].

pub mod change;
mod error;
mod execute;
pub mod plan;
pub mod planner;
mod reconciler;
mod remote;
mod render;
pub mod request;

pub use change::{
    ColumnChangeKind, ParseKindError, PolicyChangeKind, RelationChangeKind, RoleChangeKind,
    TableChangeKind,
};
pub use error::{BoxError, Error, ValidationError};
pub use execute::{
    ApplyError, ApplyPolicy, ApplyReport, PlanExecutor, SqlClient, SqlPlanExecutor, apply_plan,
};
pub use plan::{
    ColumnAlteration, ColumnFieldChange, ColumnOperation, Operation, Plan, PolicyOperation,
    PolicyRef, PrimaryKeyChange, RelationOperation, RoleOperation, TableOperation, TableRef,
};
pub use planner::{
    plan_create_policy, plan_create_role, plan_create_table, plan_drop_policy, plan_drop_role,
    plan_drop_table, plan_policy_changes, plan_role_changes, plan_table_changes,
};
pub use reconciler::Reconciler;
pub use remote::{ProviderError, RemoteStateProvider};
pub use request::{
    ColumnChange, PolicyChangeRequest, RelationChange, RoleChangeRequest, TableChangeRequest,
};

pub use tidepool_config::{Capability, Config, DeploymentTarget};

pub type Result<T> = std::result::Result<T, Error>;
