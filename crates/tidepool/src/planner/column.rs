use crate::change::ColumnChangeKind;
use crate::error::ValidationError;
use crate::plan::{ColumnAlteration, ColumnFieldChange, ColumnOperation};
use crate::request::ColumnChange;
use tidepool_model::{Column, Table};
use tracing::debug;

/// Field pairs whose relative order inside one alteration is fixed: the first
/// kind always applies before the second, whatever order they were declared in.
const FIELD_ORDER: &[(ColumnChangeKind, ColumnChangeKind)] = &[
    (ColumnChangeKind::DataType, ColumnChangeKind::Identity),
    (ColumnChangeKind::Nullable, ColumnChangeKind::Identity),
    (ColumnChangeKind::DefaultValue, ColumnChangeKind::Identity),
];

/// The two table snapshots plus the table names constraints are derived from.
pub(super) struct ColumnScope<'a> {
    pub old: &'a Table,
    pub desired: &'a Table,
    /// Name the deployed constraints were created under
    pub old_table: &'a str,
    /// Name the table will have once the plan has run
    pub new_table: &'a str,
}

/// Turn one column declaration into at most one operation.
pub(super) fn plan_column(
    scope: &ColumnScope<'_>,
    change: &ColumnChange,
) -> Result<Option<ColumnOperation>, ValidationError> {
    let kinds = super::dedup_kinds(&change.kinds);
    if kinds.is_empty() {
        return Ok(None);
    }

    let old = scope.old.column(change.actual_name());
    let desired = scope.desired.column(&change.name);
    if old.is_none() && desired.is_none() {
        return Err(ValidationError::UnknownColumn {
            table: scope.desired.name.clone(),
            column: change.name.clone(),
        });
    }

    let wants_new = kinds.contains(&ColumnChangeKind::New);
    let wants_delete = kinds.contains(&ColumnChangeKind::Delete);

    if wants_new && wants_delete {
        return Err(ValidationError::ConflictingColumnKinds {
            column: change.name.clone(),
            first: ColumnChangeKind::New,
            second: ColumnChangeKind::Delete,
        });
    }

    if wants_delete {
        if let Some(other) = kinds.iter().find(|k| k.is_modification()) {
            return Err(ValidationError::ConflictingColumnKinds {
                column: change.name.clone(),
                first: ColumnChangeKind::Delete,
                second: *other,
            });
        }
        let name = old.map_or(change.actual_name(), |c| c.name.as_str());
        return Ok(Some(ColumnOperation::Drop(name.to_string())));
    }

    if wants_new {
        let Some(column) = desired else {
            return Err(ValidationError::MissingColumnDefinition {
                column: change.name.clone(),
            });
        };
        if kinds.len() > 1 {
            debug!(column = %column.name, "field changes folded into the new column definition");
        }
        return Ok(Some(ColumnOperation::Add(column.clone())));
    }

    match (old, desired) {
        (Some(old), Some(desired)) => {
            let alteration = build_alteration(scope, old, desired, order_fields(kinds));
            Ok(Some(ColumnOperation::Alter(alteration)))
        }
        (None, Some(desired)) => {
            debug!(column = %desired.name, "column is not deployed yet, adding it");
            Ok(Some(ColumnOperation::Add(desired.clone())))
        }
        (Some(_), None) => Err(ValidationError::UndeclaredColumn {
            table: scope.desired.name.clone(),
            column: change.name.clone(),
            kind: kinds[0],
        }),
        (None, None) => Ok(None),
    }
}

/// Reorder kinds so every [`FIELD_ORDER`] pair holds. Otherwise the declared
/// order is kept.
fn order_fields(mut kinds: Vec<ColumnChangeKind>) -> Vec<ColumnChangeKind> {
    for _ in 0..=FIELD_ORDER.len() {
        let mut moved = false;
        for (before, after) in FIELD_ORDER {
            let b = kinds.iter().position(|k| k == before);
            let a = kinds.iter().position(|k| k == after);
            if let (Some(b), Some(a)) = (b, a) {
                if b > a {
                    let kind = kinds.remove(b);
                    kinds.insert(a, kind);
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
    kinds
}

fn build_alteration(
    scope: &ColumnScope<'_>,
    old: &Column,
    desired: &Column,
    kinds: Vec<ColumnChangeKind>,
) -> ColumnAlteration {
    let changes = kinds
        .into_iter()
        .filter_map(|kind| field_change(scope, old, desired, kind))
        .collect();
    ColumnAlteration {
        column: old.name.clone(),
        changes,
    }
}

fn field_change(
    scope: &ColumnScope<'_>,
    old: &Column,
    desired: &Column,
    kind: ColumnChangeKind,
) -> Option<ColumnFieldChange> {
    let change = match kind {
        ColumnChangeKind::Name => ColumnFieldChange::Rename {
            from: old.name.clone(),
            to: desired.name.clone(),
        },
        ColumnChangeKind::DataType => ColumnFieldChange::DataType {
            from: old.data_type.clone(),
            to: desired.data_type.clone(),
        },
        ColumnChangeKind::Unique => {
            // Postgres keeps a constraint's original name across renames.
            let constraint = if desired.unique {
                tidepool_sql::unique_constraint_name(scope.new_table, &desired.name)
            } else {
                tidepool_sql::unique_constraint_name(scope.old_table, &old.name)
            };
            ColumnFieldChange::Unique {
                enabled: desired.unique,
                constraint,
            }
        }
        ColumnChangeKind::Nullable => ColumnFieldChange::Nullable(desired.nullable),
        ColumnChangeKind::DefaultValue => ColumnFieldChange::Default(desired.default.clone()),
        ColumnChangeKind::Identity => ColumnFieldChange::Identity {
            from: old.identity,
            to: desired.identity,
        },
        ColumnChangeKind::New | ColumnChangeKind::Delete => return None,
    };
    Some(change)
}
