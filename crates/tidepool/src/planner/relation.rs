use crate::change::RelationChangeKind;
use crate::error::ValidationError;
use crate::plan::RelationOperation;
use crate::request::RelationChange;
use tidepool_model::{Relationship, Table};
use tracing::debug;

/// The constraint name of a relationship: the explicit one, or the name
/// derived from its source when none was given. `table` stands in for an
/// empty source table.
pub(crate) fn constraint_name(relationship: &Relationship, table: &str) -> String {
    if !relationship.needs_generated_name() {
        return relationship.constraint_name.clone();
    }
    let source_table = if relationship.source_table.is_empty() {
        table
    } else {
        relationship.source_table.as_str()
    };
    tidepool_sql::relation_constraint_name(
        &relationship.source_schema,
        source_table,
        &relationship.source_column,
    )
}

/// Turn one relationship declaration into at most one step.
///
/// `dropped` holds the constraint names deleted by earlier steps of the same
/// request; creating one of those again is never skipped.
pub(super) fn plan_relation(
    desired: &Table,
    old: &Table,
    change: &RelationChange,
    force_create: bool,
    dropped: &[String],
) -> Result<Option<RelationOperation>, ValidationError> {
    let relationship = &change.relationship;
    let op = match change.kind {
        RelationChangeKind::Create => {
            let name = constraint_name(relationship, &desired.name);
            if relationship.needs_generated_name() {
                debug!(constraint = %name, "generated constraint name");
            }

            let deployed = !dropped.contains(&name)
                && old
                    .relationships
                    .iter()
                    .any(|r| constraint_name(r, deployed_table(desired, old)) == name);
            if deployed && !force_create {
                debug!(constraint = %name, "constraint already deployed, skipping creation");
                return Ok(None);
            }

            RelationOperation::Create(Relationship {
                constraint_name: name,
                ..relationship.clone()
            })
        }
        RelationChangeKind::Update => RelationOperation::Update(relationship.clone()),
        RelationChangeKind::Delete => RelationOperation::Delete {
            relationship: relationship.clone(),
            keep_index: change.keep_index,
        },
        RelationChangeKind::CreateIndex => {
            if relationship.index.is_none() {
                return Err(ValidationError::MissingIndex {
                    constraint: constraint_name(relationship, &desired.name),
                });
            }
            RelationOperation::CreateIndex(relationship.clone())
        }
        RelationChangeKind::ActionOnUpdate | RelationChangeKind::ActionOnDelete => {
            if relationship.action.is_none() {
                return Err(ValidationError::MissingAction {
                    constraint: constraint_name(relationship, &desired.name),
                    kind: change.kind,
                });
            }
            if change.kind == RelationChangeKind::ActionOnUpdate {
                RelationOperation::ActionOnUpdate(relationship.clone())
            } else {
                RelationOperation::ActionOnDelete(relationship.clone())
            }
        }
    };
    Ok(Some(op))
}

/// Name of the table as deployed, which empty source tables stand in for.
pub(super) fn deployed_table<'a>(desired: &'a Table, old: &'a Table) -> &'a str {
    if old.name.is_empty() {
        &desired.name
    } else {
        &old.name
    }
}
