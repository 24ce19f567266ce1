//! Change requests: the caller's statement of which differences matter.
//!
//! The planner never goes looking for differences on its own. A request
//! names the actual snapshot and, per column / relationship / table, the
//! kinds of change to act on.

use crate::change::{
    ColumnChangeKind, PolicyChangeKind, RelationChangeKind, RoleChangeKind, TableChangeKind,
};
use tidepool_model::{Relationship, Role, Table};

/// The change kinds that apply to one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange {
    /// Column name in the desired table
    pub name: String,
    /// Column name in the actual table, when the column is being renamed
    pub previous_name: Option<String>,
    /// Requested kinds, in the order they were declared
    pub kinds: Vec<ColumnChangeKind>,
}

impl ColumnChange {
    pub fn new(name: impl Into<String>, kinds: impl IntoIterator<Item = ColumnChangeKind>) -> Self {
        Self {
            name: name.into(),
            previous_name: None,
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Name the column as it is currently deployed.
    pub fn renamed_from(mut self, previous: impl Into<String>) -> Self {
        self.previous_name = Some(previous.into());
        self
    }

    /// The name to look up in the actual table.
    pub fn actual_name(&self) -> &str {
        self.previous_name.as_deref().unwrap_or(&self.name)
    }
}

/// One relationship-level step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationChange {
    pub relationship: Relationship,
    pub kind: RelationChangeKind,
    /// For `Delete`: leave the supporting index in place
    pub keep_index: bool,
}

impl RelationChange {
    pub fn new(relationship: Relationship, kind: RelationChangeKind) -> Self {
        Self {
            relationship,
            kind,
            keep_index: false,
        }
    }

    pub fn keep_index(mut self) -> Self {
        self.keep_index = true;
        self
    }
}

/// Everything the planner needs to reconcile one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableChangeRequest {
    /// The actual (deployed) table
    pub old: Table,
    pub columns: Vec<ColumnChange>,
    pub table_changes: Vec<TableChangeKind>,
    pub relations: Vec<RelationChange>,
    /// Emit relationship creation even when the actual table already has a
    /// constraint with the same name.
    pub force_create_relation: bool,
}

impl TableChangeRequest {
    pub fn new(old: Table) -> Self {
        Self {
            old,
            ..Default::default()
        }
    }

    pub fn column(mut self, change: ColumnChange) -> Self {
        self.columns.push(change);
        self
    }

    pub fn table_change(mut self, kind: TableChangeKind) -> Self {
        self.table_changes.push(kind);
        self
    }

    pub fn table_changes(mut self, kinds: impl IntoIterator<Item = TableChangeKind>) -> Self {
        self.table_changes.extend(kinds);
        self
    }

    pub fn relation(mut self, change: RelationChange) -> Self {
        self.relations.push(change);
        self
    }

    pub fn force_create_relation(mut self, force: bool) -> Self {
        self.force_create_relation = force;
        self
    }

    /// Whether the request declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.kinds.is_empty())
            && self.table_changes.is_empty()
            && self.relations.is_empty()
    }
}

/// Role attributes to reconcile, against the deployed role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleChangeRequest {
    pub old: Role,
    pub changes: Vec<RoleChangeKind>,
}

impl RoleChangeRequest {
    pub fn new(old: Role, changes: impl IntoIterator<Item = RoleChangeKind>) -> Self {
        Self {
            old,
            changes: changes.into_iter().collect(),
        }
    }
}

/// Policy attributes to reconcile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyChangeRequest {
    /// Name of the deployed policy to alter
    pub name: String,
    pub changes: Vec<PolicyChangeKind>,
}

impl PolicyChangeRequest {
    pub fn new(name: impl Into<String>, changes: impl IntoIterator<Item = PolicyChangeKind>) -> Self {
        Self {
            name: name.into(),
            changes: changes.into_iter().collect(),
        }
    }
}
