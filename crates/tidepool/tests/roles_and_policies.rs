mod common;

use common::{local_policy, new_table};
use indexmap::IndexMap;
use tidepool::{
    Operation, PolicyChangeKind, PolicyChangeRequest, PolicyOperation, RoleChangeKind,
    RoleChangeRequest, RoleOperation, ValidationError, plan_create_policy, plan_create_role,
    plan_create_table, plan_drop_policy, plan_drop_role, plan_drop_table, plan_policy_changes,
    plan_role_changes,
};
use tidepool_model::{ConfigValue, Policy, Role, Table};

fn role_kinds(ops: &[Operation]) -> Vec<RoleChangeKind> {
    ops.iter()
        .map(|op| match op {
            Operation::Role { op, .. } => op.kind(),
            other => panic!("expected a role operation, got {}", other),
        })
        .collect()
}

#[test]
fn test_role_kinds_map_one_to_one() {
    let mut desired = Role::new("some-role");
    desired.connection_limit = 20;
    desired.can_login = true;
    desired.valid_until = Some("2030-01-01T00:00:00Z".parse().unwrap());
    desired
        .config
        .insert("search_path".to_string(), ConfigValue::from("public"));

    let kinds = [
        RoleChangeKind::ValidUntil,
        RoleChangeKind::ConnectionLimit,
        RoleChangeKind::CanLogin,
        RoleChangeKind::IsSuperUser,
        RoleChangeKind::Config,
    ];
    let plan =
        plan_role_changes(&desired, &RoleChangeRequest::new(Role::new("some-role"), kinds))
            .unwrap();
    assert_eq!(role_kinds(plan.operations()), kinds.to_vec());
    assert_eq!(
        plan.operations()[1],
        Operation::Role {
            role: "some-role".to_string(),
            op: RoleOperation::ConnectionLimit(20)
        }
    );

    let mut config = IndexMap::new();
    config.insert("search_path".to_string(), ConfigValue::from("public"));
    assert_eq!(
        plan.operations()[4],
        Operation::Role {
            role: "some-role".to_string(),
            op: RoleOperation::Config(config)
        }
    );
}

#[test]
fn test_every_role_kind() {
    let request = RoleChangeRequest::new(Role::new("some-role"), RoleChangeKind::ALL.to_vec());
    let plan = plan_role_changes(&Role::new("some-role"), &request).unwrap();
    assert_eq!(role_kinds(plan.operations()), RoleChangeKind::ALL.to_vec());
}

#[test]
fn test_role_without_name_is_rejected() {
    let request = RoleChangeRequest::new(Role::new("some-role"), [RoleChangeKind::CanLogin]);
    assert_eq!(
        plan_role_changes(&Role::default(), &request).unwrap_err(),
        ValidationError::EmptyRoleName
    );
    assert_eq!(
        plan_role_changes(&Role::default(), &RoleChangeRequest::default()).unwrap_err(),
        ValidationError::EmptyRoleName
    );
}

#[test]
fn test_policy_update() {
    let request = PolicyChangeRequest::new(
        "some-policy",
        [
            PolicyChangeKind::Name,
            PolicyChangeKind::Definition,
            PolicyChangeKind::Check,
            PolicyChangeKind::Roles,
        ],
    );
    let mut desired = local_policy();
    desired.name = "renamed-policy".to_string();

    let plan = plan_policy_changes(&desired, &request).unwrap();
    let ops: Vec<_> = plan
        .iter()
        .map(|op| match op {
            Operation::Policy { policy, op } => (policy.name.as_str(), op.clone()),
            other => panic!("expected a policy operation, got {}", other),
        })
        .collect();

    assert_eq!(
        ops,
        vec![
            (
                "some-policy",
                PolicyOperation::Rename {
                    from: "some-policy".to_string(),
                    to: "renamed-policy".to_string()
                }
            ),
            (
                "renamed-policy",
                PolicyOperation::Definition("SOME DEFINITION".to_string())
            ),
            (
                "renamed-policy",
                PolicyOperation::Check {
                    check: Some("some-check".to_string()),
                    using: "SOME DEFINITION".to_string()
                }
            ),
            (
                "renamed-policy",
                PolicyOperation::Roles(vec!["some-role".to_string()])
            ),
        ]
    );
}

#[test]
fn test_policy_identity_is_required() {
    let request = PolicyChangeRequest::new("some-policy", [PolicyChangeKind::Roles]);
    assert_eq!(
        plan_policy_changes(&Policy::default(), &request).unwrap_err(),
        ValidationError::EmptyPolicyName
    );

    let request = PolicyChangeRequest::new("", [PolicyChangeKind::Roles]);
    assert_eq!(
        plan_policy_changes(&local_policy(), &request).unwrap_err(),
        ValidationError::EmptyPolicyTarget
    );
}

#[test]
fn test_policy_role_order_is_irrelevant_for_equality() {
    let mut a = local_policy();
    a.roles = vec!["anon".to_string(), "authenticated".to_string()];
    let mut b = a.clone();
    b.roles.reverse();
    assert_eq!(a, b);
}

#[test]
fn test_create_and_drop_table() {
    let plan = plan_create_table(&new_table()).unwrap();
    assert_eq!(plan.len(), 1);
    let Operation::CreateTable(table) = &plan.operations()[0] else {
        panic!("expected a create table operation");
    };
    assert_eq!(table.relationships[0].constraint_name, "some-constraint");

    let mut unnamed = new_table();
    unnamed.relationships[0].constraint_name.clear();
    let plan = plan_create_table(&unnamed).unwrap();
    let Operation::CreateTable(table) = &plan.operations()[0] else {
        panic!("expected a create table operation");
    };
    assert_eq!(
        table.relationships[0].constraint_name,
        "some-schema_some-table_some-column_fkey"
    );

    assert_eq!(
        plan_create_table(&Table::default()).unwrap_err(),
        ValidationError::EmptyTableName
    );

    let plan = plan_drop_table(&new_table(), true).unwrap();
    assert_eq!(
        plan.operations()[0].to_sql(),
        vec![r#"DROP TABLE IF EXISTS "some-schema"."some-table" CASCADE"#]
    );
    assert!(plan.operations()[0].is_exactly_once());
    assert_eq!(
        plan_drop_table(&Table::default(), false).unwrap_err(),
        ValidationError::EmptyTableName
    );
}

#[test]
fn test_create_and_drop_role() {
    assert_eq!(plan_create_role(&Role::new("some-role")).unwrap().len(), 1);
    assert_eq!(
        plan_create_role(&Role::default()).unwrap_err(),
        ValidationError::EmptyRoleName
    );

    let plan = plan_drop_role(&Role::new("some-role")).unwrap();
    assert_eq!(
        plan.operations()[0].to_sql(),
        vec![r#"DROP ROLE IF EXISTS "some-role""#]
    );
    assert_eq!(
        plan_drop_role(&Role::default()).unwrap_err(),
        ValidationError::EmptyRoleName
    );
}

#[test]
fn test_create_and_drop_policy() {
    let plan = plan_create_policy(&local_policy()).unwrap();
    assert!(matches!(&plan.operations()[0], Operation::CreatePolicy(p) if p == &local_policy()));

    let plan = plan_drop_policy(&local_policy()).unwrap();
    assert_eq!(
        plan.operations()[0].to_sql(),
        vec![r#"DROP POLICY IF EXISTS "some-policy" ON "some-schema"."some-table""#]
    );
    assert_eq!(
        plan_drop_policy(&Policy::default()).unwrap_err(),
        ValidationError::EmptyPolicyName
    );
}

#[test]
fn test_policy_name_helper() {
    assert_eq!(
        tidepool_sql::policy_name("some-role", "some-table", "read"),
        "enable some-role access for some-table read"
    );
}
