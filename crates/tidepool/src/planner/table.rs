use super::column::{ColumnScope, plan_column};
use super::relation::{constraint_name, deployed_table, plan_relation};
use crate::change::TableChangeKind;
use crate::error::ValidationError;
use crate::plan::{
    Operation, Plan, PrimaryKeyChange, RelationOperation, TableOperation, TableRef,
};
use crate::request::TableChangeRequest;
use tidepool_model::{PrimaryKey, Table};
use tracing::debug;

/// Plan the changes that bring `request.old` in line with `desired`.
///
/// Only the declared kinds are acted on. A request that declares nothing
/// yields an empty plan, whatever the two snapshots look like.
pub fn plan_table_changes(
    desired: &Table,
    request: &TableChangeRequest,
) -> Result<Plan, ValidationError> {
    let span = tracing::debug_span!("plan.table", table = %TableRef::of(desired));
    let _guard = span.enter();

    super::validate_table(desired)?;

    let old = &request.old;
    let old_name = if old.name.is_empty() {
        desired.name.as_str()
    } else {
        old.name.as_str()
    };
    let mut current = TableRef::new(&old.schema, old_name);

    let mut operations = Vec::new();

    for kind in super::dedup_kinds(&request.table_changes) {
        let op = match kind {
            TableChangeKind::Schema => TableOperation::SetSchema {
                from: current.schema.clone(),
                to: desired.schema.clone(),
            },
            TableChangeKind::Name => TableOperation::Rename {
                from: current.name.clone(),
                to: desired.name.clone(),
            },
            TableChangeKind::RlsEnable => TableOperation::EnableRls(desired.rls_enabled),
            TableChangeKind::RlsForced => TableOperation::ForceRls(desired.rls_forced),
            TableChangeKind::PrimaryKey => {
                let Some(change) = primary_key_change(desired, old)? else {
                    debug!("no primary key on either side, nothing to change");
                    continue;
                };
                if let Some((name, column)) = undeployed_key_column(&change, old) {
                    return Err(ValidationError::PrimaryKeyOnNewColumn {
                        name: name.to_string(),
                        column: column.to_string(),
                    });
                }
                TableOperation::PrimaryKey(change)
            }
        };

        operations.push(Operation::Table {
            table: current.clone(),
            op,
        });

        match kind {
            TableChangeKind::Schema => current.schema = desired.schema.clone(),
            TableChangeKind::Name => current.name = desired.name.clone(),
            _ => {}
        }
    }

    let scope = ColumnScope {
        old,
        desired,
        old_table: old_name,
        new_table: &current.name,
    };
    for change in &request.columns {
        if let Some(op) = plan_column(&scope, change)? {
            operations.push(Operation::Column {
                table: current.clone(),
                op,
            });
        }
    }

    let mut dropped = Vec::new();
    for change in &request.relations {
        let step = plan_relation(
            desired,
            old,
            change,
            request.force_create_relation,
            &dropped,
        )?;
        if let Some(op) = step {
            if let RelationOperation::Delete { relationship, .. } = &op {
                dropped.push(constraint_name(relationship, deployed_table(desired, old)));
            }
            operations.push(Operation::Relation {
                table: current.clone(),
                op,
            });
        }
    }

    debug!(operations = operations.len(), "table plan ready");
    Ok(Plan::new(operations))
}

/// How the primary key has to move, or `None` when neither side has one.
///
/// A desired key without columns keeps the deployed key's columns, so only
/// its name can change.
fn primary_key_change(
    desired: &Table,
    old: &Table,
) -> Result<Option<PrimaryKeyChange>, ValidationError> {
    let named = |pk: &PrimaryKey| {
        if pk.name.trim().is_empty() {
            tidepool_sql::primary_key_name(&desired.name)
        } else {
            pk.name.clone()
        }
    };

    let change = match (old.primary_key(), desired.primary_key()) {
        (None, None) => return Ok(None),
        (Some(old_pk), None) => PrimaryKeyChange::Drop {
            name: old_pk.name.clone(),
        },
        (None, Some(new_pk)) => {
            let name = named(new_pk);
            if new_pk.columns.is_empty() {
                return Err(ValidationError::PrimaryKeyWithoutColumns { name });
            }
            PrimaryKeyChange::Add(PrimaryKey {
                name,
                columns: new_pk.columns.clone(),
            })
        }
        (Some(old_pk), Some(new_pk)) => {
            let name = named(new_pk);
            if new_pk.columns.is_empty() || new_pk.columns == old_pk.columns {
                PrimaryKeyChange::Rename {
                    from: old_pk.name.clone(),
                    to: name,
                }
            } else {
                PrimaryKeyChange::Replace {
                    drop: old_pk.name.clone(),
                    add: PrimaryKey {
                        name,
                        columns: new_pk.columns.clone(),
                    },
                }
            }
        }
    };
    Ok(Some(change))
}

/// The key being added and the first of its columns the deployed table lacks.
///
/// Table-level steps run before column steps, so such a key would reference a
/// column that does not exist yet.
fn undeployed_key_column<'a>(
    change: &'a PrimaryKeyChange,
    old: &Table,
) -> Option<(&'a str, &'a str)> {
    let added = match change {
        PrimaryKeyChange::Add(pk) | PrimaryKeyChange::Replace { add: pk, .. } => pk,
        PrimaryKeyChange::Drop { .. } | PrimaryKeyChange::Rename { .. } => return None,
    };
    added
        .columns
        .iter()
        .find(|c| !old.has_column(c))
        .map(|c| (added.name.as_str(), c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ColumnChangeKind;
    use crate::request::ColumnChange;
    use tidepool_model::Column;

    fn post() -> Table {
        let mut table = Table::new("public", "post");
        table.columns = vec![
            Column::new("id", "int8").not_null(),
            Column::new("title", "text").not_null(),
        ];
        table.primary_keys = vec![PrimaryKey::new("post_pkey").on(["id"])];
        table
    }

    #[test]
    fn test_rename_retargets_later_operations() {
        let old = post();
        let mut desired = post();
        desired.name = "article".to_string();
        desired.columns[1].nullable = true;

        let request = TableChangeRequest::new(old)
            .table_change(TableChangeKind::Name)
            .column(ColumnChange::new("title", [ColumnChangeKind::Nullable]));
        let plan = plan_table_changes(&desired, &request).unwrap();

        let ops = plan.operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            Operation::Table { table, op: TableOperation::Rename { .. } } if table.name == "post"
        ));
        assert!(matches!(
            &ops[1],
            Operation::Column { table, .. } if table.name == "article"
        ));
    }

    #[test]
    fn test_primary_key_on_new_column_is_rejected() {
        let old = post();
        let mut desired = post();
        desired.columns.push(Column::new("slug", "text").not_null());
        desired.primary_keys = vec![PrimaryKey::new("post_pkey").on(["slug"])];

        let request = TableChangeRequest::new(old)
            .table_changes([TableChangeKind::PrimaryKey, TableChangeKind::RlsEnable])
            .column(ColumnChange::new("slug", [ColumnChangeKind::New]));
        assert_eq!(
            plan_table_changes(&desired, &request).unwrap_err(),
            ValidationError::PrimaryKeyOnNewColumn {
                name: "post_pkey".to_string(),
                column: "slug".to_string()
            }
        );

        // once the column is deployed the key is replaced in place
        let mut deployed = post();
        deployed.columns.push(Column::new("slug", "text").not_null());
        let request = TableChangeRequest::new(deployed)
            .table_changes([TableChangeKind::PrimaryKey, TableChangeKind::RlsEnable]);
        let plan = plan_table_changes(&desired, &request).unwrap();
        assert!(matches!(
            &plan.operations()[0],
            Operation::Table {
                op: TableOperation::PrimaryKey(PrimaryKeyChange::Replace { .. }),
                ..
            }
        ));
        assert!(matches!(
            &plan.operations()[1],
            Operation::Table { op: TableOperation::EnableRls(false), .. }
        ));
    }

    #[test]
    fn test_primary_key_changes() {
        let old = post();
        let mut desired = post();

        desired.primary_keys = vec![PrimaryKey::new("")];
        assert_eq!(
            primary_key_change(&desired, &old).unwrap(),
            Some(PrimaryKeyChange::Rename {
                from: "post_pkey".to_string(),
                to: "post_pkey".to_string()
            })
        );

        desired.primary_keys.clear();
        assert_eq!(
            primary_key_change(&desired, &old).unwrap(),
            Some(PrimaryKeyChange::Drop {
                name: "post_pkey".to_string()
            })
        );

        let mut bare = post();
        bare.primary_keys.clear();
        assert_eq!(primary_key_change(&desired, &bare).unwrap(), None);

        desired.primary_keys = vec![PrimaryKey::new("post_key")];
        assert_eq!(
            primary_key_change(&desired, &bare).unwrap_err(),
            ValidationError::PrimaryKeyWithoutColumns {
                name: "post_key".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_column_rejects_the_whole_request() {
        let request = TableChangeRequest::new(post())
            .table_change(TableChangeKind::RlsEnable)
            .column(ColumnChange::new("missing", [ColumnChangeKind::DataType]));
        let err = plan_table_changes(&post(), &request).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownColumn {
                table: "post".to_string(),
                column: "missing".to_string()
            }
        );
    }
}
