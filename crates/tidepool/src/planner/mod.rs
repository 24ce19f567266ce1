//! The diff compiler.
//!
//! Each entry point takes a desired snapshot plus a change request and
//! returns a [`Plan`](crate::Plan), or a [`ValidationError`] and nothing
//! else. Planning performs no I/O and never mutates its inputs.
//!
//! Table plans are assembled in three sections: table-level operations in
//! declared order, then one operation per declared column, then relationship
//! steps in declared order. A primary key may only cover columns that are
//! already deployed.

mod column;
mod entity;
mod policy;
mod relation;
mod role;
mod table;

pub use entity::{
    plan_create_policy, plan_create_role, plan_create_table, plan_drop_policy, plan_drop_role,
    plan_drop_table,
};
pub use policy::plan_policy_changes;
pub(crate) use relation::constraint_name;
pub use role::plan_role_changes;
pub use table::plan_table_changes;

use crate::error::ValidationError;
use std::fmt::Display;
use tidepool_model::Table;

/// Drop repeated kinds, keeping the first occurrence of each.
fn dedup_kinds<K: Copy + PartialEq + Display>(kinds: &[K]) -> Vec<K> {
    let mut out: Vec<K> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if out.contains(kind) {
            tracing::debug!(kind = %kind, "ignoring repeated change kind");
        } else {
            out.push(*kind);
        }
    }
    out
}

/// Structural checks every desired table must pass.
fn validate_table(table: &Table) -> Result<(), ValidationError> {
    if table.name.trim().is_empty() {
        return Err(ValidationError::EmptyTableName);
    }
    if let Some(column) = table.duplicate_columns().first() {
        return Err(ValidationError::DuplicateColumn {
            table: table.name.clone(),
            column: column.to_string(),
        });
    }
    if table.primary_keys.len() > 1 {
        return Err(ValidationError::MultiplePrimaryKeys {
            table: table.name.clone(),
            count: table.primary_keys.len(),
        });
    }
    if let Some(pk) = table.primary_key() {
        if let Some(column) = pk.columns.iter().find(|c| !table.has_column(c)) {
            return Err(ValidationError::UnknownPrimaryKeyColumn {
                name: pk.name.clone(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::TableChangeKind;
    use tidepool_model::{Column, PrimaryKey};

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let kinds = [
            TableChangeKind::Name,
            TableChangeKind::Schema,
            TableChangeKind::Name,
        ];
        assert_eq!(
            dedup_kinds(&kinds),
            vec![TableChangeKind::Name, TableChangeKind::Schema]
        );
    }

    #[test]
    fn test_validate_table() {
        assert_eq!(
            validate_table(&Table::default()),
            Err(ValidationError::EmptyTableName)
        );

        let mut table = Table::new("public", "post");
        table.columns = vec![Column::new("id", "int8"), Column::new("id", "int8")];
        assert!(matches!(
            validate_table(&table),
            Err(ValidationError::DuplicateColumn { .. })
        ));

        table.columns.pop();
        table.primary_keys = vec![PrimaryKey::new("a"), PrimaryKey::new("b")];
        assert!(matches!(
            validate_table(&table),
            Err(ValidationError::MultiplePrimaryKeys { count: 2, .. })
        ));

        table.primary_keys = vec![PrimaryKey::new("post_pkey").on(["slug"])];
        assert_eq!(
            validate_table(&table),
            Err(ValidationError::UnknownPrimaryKeyColumn {
                name: "post_pkey".to_string(),
                column: "slug".to_string(),
            })
        );

        table.primary_keys = vec![PrimaryKey::new("post_pkey").on(["id"])];
        assert_eq!(validate_table(&table), Ok(()));
    }
}
