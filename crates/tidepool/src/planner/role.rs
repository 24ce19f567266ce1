use crate::change::RoleChangeKind;
use crate::error::ValidationError;
use crate::plan::{Operation, Plan, RoleOperation};
use crate::request::RoleChangeRequest;
use tidepool_model::{Role, UNLIMITED_CONNECTIONS};

/// Plan one attribute change per requested kind, in declared order.
///
/// Every operation carries the desired value. Operations after a rename
/// address the role by its new name.
pub fn plan_role_changes(
    desired: &Role,
    request: &RoleChangeRequest,
) -> Result<Plan, ValidationError> {
    let span = tracing::debug_span!("plan.role", role = %desired.name);
    let _guard = span.enter();

    validate_role(desired)?;

    let mut current = if request.old.name.is_empty() {
        desired.name.clone()
    } else {
        request.old.name.clone()
    };

    let mut operations = Vec::new();
    for kind in super::dedup_kinds(&request.changes) {
        let op = match kind {
            RoleChangeKind::ConnectionLimit => {
                RoleOperation::ConnectionLimit(desired.connection_limit)
            }
            RoleChangeKind::Name => RoleOperation::Rename {
                from: current.clone(),
                to: desired.name.clone(),
            },
            RoleChangeKind::IsReplication => RoleOperation::Replication(desired.is_replication),
            RoleChangeKind::IsSuperUser => RoleOperation::SuperUser(desired.is_superuser),
            RoleChangeKind::InheritRole => RoleOperation::Inherit(desired.inherit_role),
            RoleChangeKind::CanBypassRls => RoleOperation::BypassRls(desired.can_bypass_rls),
            RoleChangeKind::CanCreateRole => RoleOperation::CreateRole(desired.can_create_role),
            RoleChangeKind::CanCreateDb => RoleOperation::CreateDb(desired.can_create_db),
            RoleChangeKind::CanLogin => RoleOperation::Login(desired.can_login),
            RoleChangeKind::ValidUntil => RoleOperation::ValidUntil(desired.valid_until),
            RoleChangeKind::Config => RoleOperation::Config(desired.config.clone()),
        };
        operations.push(Operation::Role {
            role: current.clone(),
            op,
        });
        if kind == RoleChangeKind::Name {
            current = desired.name.clone();
        }
    }

    Ok(Plan::new(operations))
}

pub(super) fn validate_role(role: &Role) -> Result<(), ValidationError> {
    if role.name.trim().is_empty() {
        return Err(ValidationError::EmptyRoleName);
    }
    if role.connection_limit < UNLIMITED_CONNECTIONS {
        return Err(ValidationError::InvalidConnectionLimit {
            role: role.name.clone(),
            limit: role.connection_limit,
        });
    }
    Ok(())
}
