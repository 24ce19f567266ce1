#![allow(dead_code)]

use tidepool_model::{
    Column, IdentityGeneration, Policy, PolicyCommand, PrimaryKey, Relationship, Table,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fk(constraint: &str) -> Relationship {
    Relationship {
        constraint_name: constraint.to_string(),
        source_schema: "some-schema".to_string(),
        source_column: "some-column".to_string(),
        target_schema: "other-schema".to_string(),
        ..Default::default()
    }
}

/// The desired table: json + identity bool columns, RLS on, key `some-pk`.
pub fn new_table() -> Table {
    Table {
        schema: "some-schema".to_string(),
        name: "some-table".to_string(),
        columns: vec![
            Column::new("some-column", "json").with_default(r#"[{"key": "value"}]"#),
            Column::new("another-column", "bool")
                .not_null()
                .with_default("true")
                .identity(IdentityGeneration::ByDefault),
        ],
        relationships: vec![fk("some-constraint")],
        primary_keys: vec![PrimaryKey::new("some-pk")],
        rls_enabled: true,
        rls_forced: true,
    }
}

/// The deployed table: two text columns, key `old-pk`, no schema.
pub fn old_table() -> Table {
    Table {
        schema: String::new(),
        name: "some-table".to_string(),
        columns: vec![
            Column::new("some-column", "text"),
            Column::new("another-column", "text"),
        ],
        relationships: vec![fk("some-constraint")],
        primary_keys: vec![PrimaryKey::new("old-pk")],
        rls_enabled: false,
        rls_forced: false,
    }
}

pub fn local_policy() -> Policy {
    Policy {
        name: "some-policy".to_string(),
        schema: "some-schema".to_string(),
        table: "some-table".to_string(),
        command: PolicyCommand::All,
        definition: "SOME DEFINITION".to_string(),
        check: Some("some-check".to_string()),
        roles: vec!["some-role".to_string()],
    }
}
