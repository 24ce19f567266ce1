//! SQL rendering: the statement batch an executor sends for each operation.
//!
//! Statements come back without a trailing `;`. A batch can be empty, e.g.
//! for a rename whose old and new names are equal.

use crate::plan::{
    ColumnAlteration, ColumnFieldChange, ColumnOperation, Operation, PolicyOperation, PolicyRef,
    PrimaryKeyChange, RelationOperation, RoleOperation, TableOperation, TableRef,
};
use crate::planner::constraint_name;
use indexmap::IndexMap;
use tidepool_model::{Column, ConfigValue, Policy, PrimaryKey, Relationship, Role, Table};
use tidepool_sql::{Ident, Lit, qualified_name};

impl Operation {
    /// Render this operation as SQL statements, in execution order.
    pub fn to_sql(&self) -> Vec<String> {
        match self {
            Operation::CreateTable(table) => create_table_sql(table),
            Operation::DropTable { table, cascade } => {
                let cascade = if *cascade { " CASCADE" } else { "" };
                vec![format!("DROP TABLE IF EXISTS {}{}", table.to_sql(), cascade)]
            }
            Operation::Table { table, op } => table_sql(table, op),
            Operation::Column { table, op } => column_sql(table, op),
            Operation::Relation { table, op } => relation_sql(table, op),
            Operation::CreateRole(role) => create_role_sql(role),
            Operation::DropRole { role } => vec![format!("DROP ROLE IF EXISTS {}", Ident(role))],
            Operation::Role { role, op } => role_sql(role, op),
            Operation::CreatePolicy(policy) => vec![create_policy_sql(policy)],
            Operation::DropPolicy { policy } => vec![format!(
                "DROP POLICY IF EXISTS {} ON {}",
                Ident(&policy.name),
                policy.table.to_sql()
            )],
            Operation::Policy { policy, op } => policy_sql(policy, op),
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

fn column_definition(col: &Column) -> String {
    let mut def = format!("{} {}", Ident(&col.name), col.data_type);
    if !col.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = &col.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }
    if let Some(generation) = col.identity {
        def.push_str(&format!(" GENERATED {} AS IDENTITY", generation));
    }
    if col.unique {
        def.push_str(" UNIQUE");
    }
    def
}

fn key_columns(pk: &PrimaryKey) -> String {
    pk.columns
        .iter()
        .map(|c| Ident(c).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_table_sql(table: &Table) -> Vec<String> {
    let table_ref = TableRef::of(table);
    let mut lines: Vec<String> = table.columns.iter().map(column_definition).collect();

    if let Some(pk) = table.primary_key() {
        if !pk.columns.is_empty() {
            let name = if pk.name.is_empty() {
                tidepool_sql::primary_key_name(&table.name)
            } else {
                pk.name.clone()
            };
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                Ident(&name),
                key_columns(pk)
            ));
        }
    }

    for rel in &table.relationships {
        lines.push(format!(
            "CONSTRAINT {} {}",
            Ident(constraint_name(rel, &table.name)),
            foreign_key_clause(rel)
        ));
    }

    let mut statements = vec![format!(
        "CREATE TABLE {} (\n    {}\n)",
        table_ref.to_sql(),
        lines.join(",\n    ")
    )];
    if table.rls_enabled {
        statements.push(format!(
            "ALTER TABLE {} ENABLE ROW LEVEL SECURITY",
            table_ref.to_sql()
        ));
    }
    if table.rls_forced {
        statements.push(format!(
            "ALTER TABLE {} FORCE ROW LEVEL SECURITY",
            table_ref.to_sql()
        ));
    }
    for index in table.relationships.iter().filter_map(|r| r.index.as_ref()) {
        statements.push(index.definition.clone());
    }
    statements
}

fn table_sql(table: &TableRef, op: &TableOperation) -> Vec<String> {
    let t = table.to_sql();
    match op {
        TableOperation::SetSchema { from, to } => {
            if from == to {
                return Vec::new();
            }
            vec![format!("ALTER TABLE {} SET SCHEMA {}", t, Ident(to))]
        }
        TableOperation::Rename { from, to } => {
            if from == to {
                return Vec::new();
            }
            vec![format!("ALTER TABLE {} RENAME TO {}", t, Ident(to))]
        }
        TableOperation::EnableRls(enabled) => {
            let verb = if *enabled { "ENABLE" } else { "DISABLE" };
            vec![format!("ALTER TABLE {} {} ROW LEVEL SECURITY", t, verb)]
        }
        TableOperation::ForceRls(forced) => {
            let verb = if *forced { "FORCE" } else { "NO FORCE" };
            vec![format!("ALTER TABLE {} {} ROW LEVEL SECURITY", t, verb)]
        }
        TableOperation::PrimaryKey(change) => {
            let drop = |name: &str| {
                format!("ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}", t, Ident(name))
            };
            let add = |pk: &PrimaryKey| {
                format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
                    t,
                    Ident(&pk.name),
                    key_columns(pk)
                )
            };
            match change {
                PrimaryKeyChange::Add(pk) => vec![add(pk)],
                PrimaryKeyChange::Drop { name } => vec![drop(name)],
                PrimaryKeyChange::Rename { from, to } => {
                    if from == to {
                        return Vec::new();
                    }
                    vec![format!(
                        "ALTER TABLE {} RENAME CONSTRAINT {} TO {}",
                        t,
                        Ident(from),
                        Ident(to)
                    )]
                }
                PrimaryKeyChange::Replace { drop: old, add: pk } => vec![drop(old), add(pk)],
            }
        }
    }
}

// =============================================================================
// Columns
// =============================================================================

fn column_sql(table: &TableRef, op: &ColumnOperation) -> Vec<String> {
    let t = table.to_sql();
    match op {
        ColumnOperation::Add(col) => vec![format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
            t,
            column_definition(col)
        )],
        ColumnOperation::Drop(name) => {
            vec![format!("ALTER TABLE {} DROP COLUMN IF EXISTS {}", t, Ident(name))]
        }
        ColumnOperation::Alter(alter) => alter_column_sql(&t, alter),
    }
}

/// One statement per field change. Statements after a rename use the new name.
fn alter_column_sql(t: &str, alter: &ColumnAlteration) -> Vec<String> {
    let mut current = alter.column.clone();
    let mut statements = Vec::new();

    for change in &alter.changes {
        let col = Ident(&current).to_string();
        let statement = match change {
            ColumnFieldChange::Rename { from, to } => {
                if from == to {
                    continue;
                }
                let sql = format!("ALTER TABLE {} RENAME COLUMN {} TO {}", t, col, Ident(to));
                current = to.clone();
                sql
            }
            ColumnFieldChange::DataType { from, to } => {
                if from == to {
                    continue;
                }
                format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{}",
                    t, col, to, col, to
                )
            }
            ColumnFieldChange::Unique {
                enabled: true,
                constraint,
            } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                t,
                Ident(constraint),
                col
            ),
            ColumnFieldChange::Unique {
                enabled: false,
                constraint,
            } => format!(
                "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
                t,
                Ident(constraint)
            ),
            ColumnFieldChange::Nullable(true) => {
                format!("ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL", t, col)
            }
            ColumnFieldChange::Nullable(false) => {
                format!("ALTER TABLE {} ALTER COLUMN {} SET NOT NULL", t, col)
            }
            ColumnFieldChange::Default(Some(default)) => format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                t, col, default
            ),
            ColumnFieldChange::Default(None) => {
                format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT", t, col)
            }
            ColumnFieldChange::Identity { from, to } => match (from, to) {
                (None, Some(generation)) => format!(
                    "ALTER TABLE {} ALTER COLUMN {} ADD GENERATED {} AS IDENTITY",
                    t, col, generation
                ),
                (Some(_), None) => {
                    format!("ALTER TABLE {} ALTER COLUMN {} DROP IDENTITY IF EXISTS", t, col)
                }
                (Some(a), Some(b)) if a != b => format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET GENERATED {}",
                    t, col, b
                ),
                _ => continue,
            },
        };
        statements.push(statement);
    }
    statements
}

// =============================================================================
// Relationships
// =============================================================================

fn foreign_key_clause(rel: &Relationship) -> String {
    let mut sql = format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        Ident(&rel.source_column),
        qualified_name(&rel.target_schema, &rel.target_table),
        Ident(&rel.target_column)
    );
    if let Some(action) = rel.action {
        sql.push_str(&format!(
            " ON UPDATE {} ON DELETE {}",
            action.on_update, action.on_delete
        ));
    }
    sql
}

/// The table a foreign key lives on: its source, falling back to the table
/// the operation targets.
fn source_table(rel: &Relationship, table: &TableRef) -> String {
    let schema = if rel.source_schema.is_empty() {
        &table.schema
    } else {
        &rel.source_schema
    };
    let name = if rel.source_table.is_empty() {
        &table.name
    } else {
        &rel.source_table
    };
    qualified_name(schema, name)
}

fn relation_sql(table: &TableRef, op: &RelationOperation) -> Vec<String> {
    let rel = op.relationship();
    let owner = source_table(rel, table);
    let name = constraint_name(rel, &table.name);

    let add = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {}",
        owner,
        Ident(&name),
        foreign_key_clause(rel)
    );
    let drop = format!(
        "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
        owner,
        Ident(&name)
    );

    match op {
        RelationOperation::Create(_) => {
            let mut statements = vec![add];
            if let Some(index) = &rel.index {
                statements.push(index.definition.clone());
            }
            statements
        }
        RelationOperation::Update(_)
        | RelationOperation::ActionOnUpdate(_)
        | RelationOperation::ActionOnDelete(_) => vec![drop, add],
        RelationOperation::Delete { keep_index, .. } => {
            let mut statements = vec![drop];
            if let (false, Some(index)) = (*keep_index, &rel.index) {
                statements.push(format!(
                    "DROP INDEX IF EXISTS {}",
                    qualified_name(&index.schema, &index.name)
                ));
            }
            statements
        }
        RelationOperation::CreateIndex(_) => rel
            .index
            .iter()
            .map(|index| index.definition.clone())
            .collect(),
    }
}

// =============================================================================
// Roles
// =============================================================================

fn flag(enabled: bool, keyword: &str) -> String {
    if enabled {
        keyword.to_string()
    } else {
        format!("NO{}", keyword)
    }
}

fn config_value_sql(value: &ConfigValue) -> String {
    match value {
        ConfigValue::String(s) => Lit(s).to_string(),
        other => other.to_string(),
    }
}

fn role_config_sql(role: &str, config: &IndexMap<String, ConfigValue>) -> Vec<String> {
    config
        .iter()
        .map(|(key, value)| {
            format!(
                "ALTER ROLE {} SET {} TO {}",
                Ident(role),
                Ident(key),
                config_value_sql(value)
            )
        })
        .collect()
}

fn create_role_sql(role: &Role) -> Vec<String> {
    let mut sql = format!(
        "CREATE ROLE {} WITH {} {} {} {} {} {} {} CONNECTION LIMIT {}",
        Ident(&role.name),
        flag(role.can_login, "LOGIN"),
        flag(role.is_superuser, "SUPERUSER"),
        flag(role.is_replication, "REPLICATION"),
        flag(role.can_create_role, "CREATEROLE"),
        flag(role.can_create_db, "CREATEDB"),
        flag(role.inherit_role, "INHERIT"),
        flag(role.can_bypass_rls, "BYPASSRLS"),
        role.connection_limit
    );
    if let Some(valid_until) = role.valid_until {
        sql.push_str(&format!(" VALID UNTIL {}", Lit(valid_until.to_string())));
    }
    let mut statements = vec![sql];
    statements.extend(role_config_sql(&role.name, &role.config));
    statements
}

fn role_sql(role: &str, op: &RoleOperation) -> Vec<String> {
    let alter = |clause: String| vec![format!("ALTER ROLE {} {}", Ident(role), clause)];
    match op {
        RoleOperation::ConnectionLimit(limit) => alter(format!("CONNECTION LIMIT {}", limit)),
        RoleOperation::Rename { from, to } => {
            if from == to {
                return Vec::new();
            }
            alter(format!("RENAME TO {}", Ident(to)))
        }
        RoleOperation::Replication(b) => alter(flag(*b, "REPLICATION")),
        RoleOperation::SuperUser(b) => alter(flag(*b, "SUPERUSER")),
        RoleOperation::Inherit(b) => alter(flag(*b, "INHERIT")),
        RoleOperation::BypassRls(b) => alter(flag(*b, "BYPASSRLS")),
        RoleOperation::CreateRole(b) => alter(flag(*b, "CREATEROLE")),
        RoleOperation::CreateDb(b) => alter(flag(*b, "CREATEDB")),
        RoleOperation::Login(b) => alter(flag(*b, "LOGIN")),
        RoleOperation::ValidUntil(Some(ts)) => {
            alter(format!("VALID UNTIL {}", Lit(ts.to_string())))
        }
        RoleOperation::ValidUntil(None) => alter("VALID UNTIL 'infinity'".to_string()),
        RoleOperation::Config(config) => {
            let mut statements = alter("RESET ALL".to_string());
            statements.extend(role_config_sql(role, config));
            statements
        }
    }
}

// =============================================================================
// Policies
// =============================================================================

fn role_list(roles: &[String]) -> String {
    if roles.is_empty() {
        return "PUBLIC".to_string();
    }
    roles
        .iter()
        .map(|r| {
            if r.eq_ignore_ascii_case("public") {
                "PUBLIC".to_string()
            } else {
                Ident(r).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_policy_sql(policy: &Policy) -> String {
    let mut sql = format!(
        "CREATE POLICY {} ON {} AS PERMISSIVE FOR {} TO {}",
        Ident(&policy.name),
        qualified_name(&policy.schema, &policy.table),
        policy.command,
        role_list(&policy.roles)
    );
    if !policy.definition.is_empty() {
        sql.push_str(&format!(" USING ({})", policy.definition));
    }
    if let Some(check) = &policy.check {
        sql.push_str(&format!(" WITH CHECK ({})", check));
    }
    sql
}

fn policy_sql(policy: &PolicyRef, op: &PolicyOperation) -> Vec<String> {
    let target = format!("{} ON {}", Ident(&policy.name), policy.table.to_sql());
    let clause = match op {
        PolicyOperation::Rename { from, to } => {
            if from == to {
                return Vec::new();
            }
            format!("RENAME TO {}", Ident(to))
        }
        PolicyOperation::Check { check, using } => {
            format!("WITH CHECK ({})", check.as_deref().unwrap_or(using))
        }
        PolicyOperation::Definition(definition) => format!("USING ({})", definition),
        PolicyOperation::Roles(roles) => format!("TO {}", role_list(roles)),
    };
    vec![format!("ALTER POLICY {} {}", target, clause)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;
    use tidepool_model::{IdentityGeneration, Index, ReferentialAction, RelationAction};

    fn post_ref() -> TableRef {
        TableRef::new("public", "post")
    }

    #[test]
    fn test_create_table() {
        let mut table = Table::new("public", "post");
        table.columns = vec![
            Column::new("id", "int8")
                .not_null()
                .identity(IdentityGeneration::Always),
            Column::new("title", "text").not_null(),
            Column::new("author_id", "int8"),
        ];
        table.primary_keys = vec![PrimaryKey::new("").on(["id"])];
        table.relationships = vec![Relationship {
            source_schema: "public".to_string(),
            source_column: "author_id".to_string(),
            target_schema: "public".to_string(),
            target_table: "user".to_string(),
            target_column: "id".to_string(),
            action: Some(RelationAction::new(
                ReferentialAction::NoAction,
                ReferentialAction::Cascade,
            )),
            ..Default::default()
        }];
        table.rls_enabled = true;

        let sql = Plan::new(vec![Operation::CreateTable(table)]).to_sql();
        insta::assert_snapshot!(sql, @r#"
        -- + table public.post
        CREATE TABLE "public"."post" (
            "id" int8 NOT NULL GENERATED ALWAYS AS IDENTITY,
            "title" text NOT NULL,
            "author_id" int8,
            CONSTRAINT "post_pkey" PRIMARY KEY ("id"),
            CONSTRAINT "public_post_author_id_fkey" FOREIGN KEY ("author_id") REFERENCES "public"."user" ("id") ON UPDATE NO ACTION ON DELETE CASCADE
        );
        ALTER TABLE "public"."post" ENABLE ROW LEVEL SECURITY;
        "#);
    }

    #[test]
    fn test_grouped_column_follows_rename() {
        let op = Operation::Column {
            table: post_ref(),
            op: ColumnOperation::Alter(ColumnAlteration {
                column: "body".to_string(),
                changes: vec![
                    ColumnFieldChange::Rename {
                        from: "body".to_string(),
                        to: "content".to_string(),
                    },
                    ColumnFieldChange::DataType {
                        from: "text".to_string(),
                        to: "jsonb".to_string(),
                    },
                    ColumnFieldChange::Nullable(false),
                    ColumnFieldChange::Default(None),
                ],
            }),
        };
        insta::assert_snapshot!(op.to_sql().join(";\n"), @r#"
        ALTER TABLE "public"."post" RENAME COLUMN "body" TO "content";
        ALTER TABLE "public"."post" ALTER COLUMN "content" TYPE jsonb USING "content"::jsonb;
        ALTER TABLE "public"."post" ALTER COLUMN "content" SET NOT NULL;
        ALTER TABLE "public"."post" ALTER COLUMN "content" DROP DEFAULT
        "#);
    }

    #[test]
    fn test_noop_renames_render_nothing() {
        let op = Operation::Column {
            table: post_ref(),
            op: ColumnOperation::Alter(ColumnAlteration {
                column: "title".to_string(),
                changes: vec![ColumnFieldChange::Rename {
                    from: "title".to_string(),
                    to: "title".to_string(),
                }],
            }),
        };
        assert!(op.to_sql().is_empty());

        let op = Operation::Table {
            table: post_ref(),
            op: TableOperation::Rename {
                from: "post".to_string(),
                to: "post".to_string(),
            },
        };
        assert!(op.to_sql().is_empty());

        let op = Operation::Role {
            role: "writer".to_string(),
            op: RoleOperation::Rename {
                from: "writer".to_string(),
                to: "writer".to_string(),
            },
        };
        assert!(op.to_sql().is_empty());
    }

    #[test]
    fn test_identity_transitions() {
        let render = |from, to| {
            Operation::Column {
                table: post_ref(),
                op: ColumnOperation::Alter(ColumnAlteration {
                    column: "id".to_string(),
                    changes: vec![ColumnFieldChange::Identity { from, to }],
                }),
            }
            .to_sql()
        };
        assert_eq!(
            render(None, Some(IdentityGeneration::ByDefault)),
            vec![
                r#"ALTER TABLE "public"."post" ALTER COLUMN "id" ADD GENERATED BY DEFAULT AS IDENTITY"#
            ]
        );
        assert_eq!(
            render(Some(IdentityGeneration::ByDefault), None),
            vec![r#"ALTER TABLE "public"."post" ALTER COLUMN "id" DROP IDENTITY IF EXISTS"#]
        );
        assert_eq!(
            render(
                Some(IdentityGeneration::ByDefault),
                Some(IdentityGeneration::Always)
            ),
            vec![r#"ALTER TABLE "public"."post" ALTER COLUMN "id" SET GENERATED ALWAYS"#]
        );
        assert!(render(None, None).is_empty());
    }

    #[test]
    fn test_relation_delete_drops_index_unless_kept() {
        let rel = Relationship {
            constraint_name: "post_author_fkey".to_string(),
            source_schema: "public".to_string(),
            source_table: "post".to_string(),
            source_column: "author_id".to_string(),
            index: Some(Index {
                schema: "public".to_string(),
                table: "post".to_string(),
                name: "post_author_idx".to_string(),
                definition: "CREATE INDEX post_author_idx ON public.post (author_id)".to_string(),
            }),
            ..Default::default()
        };

        let op = Operation::Relation {
            table: post_ref(),
            op: RelationOperation::Delete {
                relationship: rel.clone(),
                keep_index: false,
            },
        };
        assert_eq!(
            op.to_sql(),
            vec![
                r#"ALTER TABLE "public"."post" DROP CONSTRAINT IF EXISTS "post_author_fkey""#,
                r#"DROP INDEX IF EXISTS "public"."post_author_idx""#,
            ]
        );

        let op = Operation::Relation {
            table: post_ref(),
            op: RelationOperation::Delete {
                relationship: rel,
                keep_index: true,
            },
        };
        assert_eq!(op.to_sql().len(), 1);
    }

    #[test]
    fn test_relation_action_change_recreates_constraint() {
        let rel = Relationship {
            constraint_name: "constraint1".to_string(),
            source_schema: "public".to_string(),
            source_table: "table1".to_string(),
            source_column: "id".to_string(),
            target_schema: "public".to_string(),
            target_table: "table2".to_string(),
            target_column: "id".to_string(),
            action: Some(RelationAction::from_codes("c", "c").unwrap()),
            ..Default::default()
        };
        let op = Operation::Relation {
            table: TableRef::new("some-schema", "some-table"),
            op: RelationOperation::ActionOnDelete(rel),
        };
        insta::assert_snapshot!(op.to_sql().join(";\n"), @r#"
        ALTER TABLE "public"."table1" DROP CONSTRAINT IF EXISTS "constraint1";
        ALTER TABLE "public"."table1" ADD CONSTRAINT "constraint1" FOREIGN KEY ("id") REFERENCES "public"."table2" ("id") ON UPDATE CASCADE ON DELETE CASCADE
        "#);
    }

    #[test]
    fn test_role_operations() {
        let mut config = IndexMap::new();
        config.insert("search_path".to_string(), ConfigValue::from("app, public"));
        config.insert("statement_timeout".to_string(), ConfigValue::from(5000_i64));
        let op = Operation::Role {
            role: "app".to_string(),
            op: RoleOperation::Config(config),
        };
        insta::assert_snapshot!(op.to_sql().join(";\n"), @r#"
        ALTER ROLE "app" RESET ALL;
        ALTER ROLE "app" SET "search_path" TO 'app, public';
        ALTER ROLE "app" SET "statement_timeout" TO 5000
        "#);

        let op = Operation::Role {
            role: "app".to_string(),
            op: RoleOperation::BypassRls(false),
        };
        assert_eq!(op.to_sql(), vec![r#"ALTER ROLE "app" NOBYPASSRLS"#]);

        let op = Operation::Role {
            role: "app".to_string(),
            op: RoleOperation::ValidUntil(None),
        };
        assert_eq!(op.to_sql(), vec![r#"ALTER ROLE "app" VALID UNTIL 'infinity'"#]);
    }

    #[test]
    fn test_create_role() {
        let mut role = Role::new("reporting");
        role.can_login = true;
        role.connection_limit = 10;
        assert_eq!(
            Operation::CreateRole(role).to_sql(),
            vec![
                r#"CREATE ROLE "reporting" WITH LOGIN NOSUPERUSER NOREPLICATION NOCREATEROLE NOCREATEDB INHERIT NOBYPASSRLS CONNECTION LIMIT 10"#
            ]
        );
    }

    #[test]
    fn test_policy_operations() {
        let policy = PolicyRef {
            table: TableRef::new("some-schema", "some-table"),
            name: "some-policy".to_string(),
        };
        let render = |op| {
            Operation::Policy {
                policy: policy.clone(),
                op,
            }
            .to_sql()
        };
        assert_eq!(
            render(PolicyOperation::Roles(vec![])),
            vec![r#"ALTER POLICY "some-policy" ON "some-schema"."some-table" TO PUBLIC"#]
        );
        assert_eq!(
            render(PolicyOperation::Roles(vec![
                "anon".to_string(),
                "public".to_string()
            ])),
            vec![r#"ALTER POLICY "some-policy" ON "some-schema"."some-table" TO "anon", PUBLIC"#]
        );
        assert_eq!(
            render(PolicyOperation::Check {
                check: Some("some-check".to_string()),
                using: "SOME DEFINITION".to_string()
            }),
            vec![r#"ALTER POLICY "some-policy" ON "some-schema"."some-table" WITH CHECK (some-check)"#]
        );
        // dropping the check falls back to the USING expression, never to `true`
        assert_eq!(
            render(PolicyOperation::Check {
                check: None,
                using: "owner_id = auth.uid()".to_string()
            }),
            vec![r#"ALTER POLICY "some-policy" ON "some-schema"."some-table" WITH CHECK (owner_id = auth.uid())"#]
        );
        assert_eq!(
            render(PolicyOperation::Rename {
                from: "some-policy".to_string(),
                to: "other-policy".to_string()
            }),
            vec![r#"ALTER POLICY "some-policy" ON "some-schema"."some-table" RENAME TO "other-policy""#]
        );
    }

    #[test]
    fn test_create_policy() {
        let policy = Policy {
            name: "some-policy".to_string(),
            schema: "some-schema".to_string(),
            table: "some-table".to_string(),
            definition: "SOME DEFINITION".to_string(),
            check: Some("some-check".to_string()),
            roles: vec!["some-role".to_string()],
            ..Default::default()
        };
        assert_eq!(
            Operation::CreatePolicy(policy).to_sql(),
            vec![
                r#"CREATE POLICY "some-policy" ON "some-schema"."some-table" AS PERMISSIVE FOR ALL TO "some-role" USING (SOME DEFINITION) WITH CHECK (some-check)"#
            ]
        );
    }
}
