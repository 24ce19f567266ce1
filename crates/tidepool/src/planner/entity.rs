//! Whole-entity plans: create or drop a table, role or policy.

use super::policy::validate_policy;
use super::role::validate_role;
use crate::error::ValidationError;
use crate::plan::{Operation, Plan, PolicyRef, TableRef};
use tidepool_model::{Policy, Role, Table};

/// Plan the creation of a table that is not deployed yet.
///
/// Relationships declared without a constraint name get their derived name
/// here, so the create statement and later diffs agree on it.
pub fn plan_create_table(table: &Table) -> Result<Plan, ValidationError> {
    super::validate_table(table)?;

    let mut table = table.clone();
    for relationship in &mut table.relationships {
        if relationship.needs_generated_name() {
            let name = super::constraint_name(relationship, &table.name);
            tracing::debug!(constraint = %name, "generated constraint name");
            relationship.constraint_name = name;
        }
    }
    Ok(Plan::new(vec![Operation::CreateTable(table)]))
}

pub fn plan_drop_table(table: &Table, cascade: bool) -> Result<Plan, ValidationError> {
    if table.name.trim().is_empty() {
        return Err(ValidationError::EmptyTableName);
    }
    Ok(Plan::new(vec![Operation::DropTable {
        table: TableRef::of(table),
        cascade,
    }]))
}

pub fn plan_create_role(role: &Role) -> Result<Plan, ValidationError> {
    validate_role(role)?;
    Ok(Plan::new(vec![Operation::CreateRole(role.clone())]))
}

pub fn plan_drop_role(role: &Role) -> Result<Plan, ValidationError> {
    if role.name.trim().is_empty() {
        return Err(ValidationError::EmptyRoleName);
    }
    Ok(Plan::new(vec![Operation::DropRole {
        role: role.name.clone(),
    }]))
}

pub fn plan_create_policy(policy: &Policy) -> Result<Plan, ValidationError> {
    validate_policy(policy)?;
    Ok(Plan::new(vec![Operation::CreatePolicy(policy.clone())]))
}

pub fn plan_drop_policy(policy: &Policy) -> Result<Plan, ValidationError> {
    validate_policy(policy)?;
    Ok(Plan::new(vec![Operation::DropPolicy {
        policy: PolicyRef::of(policy),
    }]))
}
