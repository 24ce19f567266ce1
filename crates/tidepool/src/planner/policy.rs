use crate::change::PolicyChangeKind;
use crate::error::ValidationError;
use crate::plan::{Operation, Plan, PolicyOperation, PolicyRef, TableRef};
use crate::request::PolicyChangeRequest;
use tidepool_model::Policy;

/// Plan one change per requested kind against the policy named in the request.
///
/// `Roles` replaces the whole role list.
pub fn plan_policy_changes(
    desired: &Policy,
    request: &PolicyChangeRequest,
) -> Result<Plan, ValidationError> {
    let span = tracing::debug_span!("plan.policy", policy = %desired.name);
    let _guard = span.enter();

    validate_policy(desired)?;
    if request.name.trim().is_empty() {
        return Err(ValidationError::EmptyPolicyTarget);
    }

    let mut current = PolicyRef {
        table: TableRef::new(&desired.schema, &desired.table),
        name: request.name.clone(),
    };

    let mut operations = Vec::new();
    for kind in super::dedup_kinds(&request.changes) {
        let op = match kind {
            PolicyChangeKind::Name => PolicyOperation::Rename {
                from: current.name.clone(),
                to: desired.name.clone(),
            },
            PolicyChangeKind::Check => PolicyOperation::Check {
                check: desired.check.clone(),
                using: desired.definition.clone(),
            },
            PolicyChangeKind::Definition => PolicyOperation::Definition(desired.definition.clone()),
            PolicyChangeKind::Roles => PolicyOperation::Roles(desired.roles.clone()),
        };
        operations.push(Operation::Policy {
            policy: current.clone(),
            op,
        });
        if kind == PolicyChangeKind::Name {
            current.name = desired.name.clone();
        }
    }

    Ok(Plan::new(operations))
}

pub(super) fn validate_policy(policy: &Policy) -> Result<(), ValidationError> {
    if policy.name.trim().is_empty() {
        return Err(ValidationError::EmptyPolicyName);
    }
    if policy.table.trim().is_empty() {
        return Err(ValidationError::EmptyPolicyTable {
            policy: policy.name.clone(),
        });
    }
    Ok(())
}
