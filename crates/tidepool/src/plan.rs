//! The change plan: an ordered list of typed operations.
//!
//! Operations are transient values. The planner builds them from a request,
//! an executor consumes them in order, and nothing keeps them afterwards.

use crate::change::{
    ColumnChangeKind, PolicyChangeKind, RelationChangeKind, RoleChangeKind, TableChangeKind,
};
use indexmap::IndexMap;
use jiff::Timestamp;
use std::fmt;
use tidepool_model::{
    Column, ConfigValue, IdentityGeneration, Policy, PrimaryKey, Relationship, Role, Table,
};

/// A table, named as it exists at the point an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn of(table: &Table) -> Self {
        Self::new(&table.schema, &table.name)
    }

    /// Quoted, schema-qualified SQL name.
    pub fn to_sql(&self) -> String {
        tidepool_sql::qualified_name(&self.schema, &self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.schema, self.name)
        }
    }
}

/// A policy, named as it exists at the point an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PolicyRef {
    pub table: TableRef,
    pub name: String,
}

impl PolicyRef {
    pub fn of(policy: &Policy) -> Self {
        Self {
            table: TableRef::new(&policy.schema, &policy.table),
            name: policy.name.clone(),
        }
    }
}

impl fmt::Display for PolicyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.name, self.table)
    }
}

/// A single-field change to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOperation {
    SetSchema { from: String, to: String },
    Rename { from: String, to: String },
    EnableRls(bool),
    ForceRls(bool),
    PrimaryKey(PrimaryKeyChange),
}

impl TableOperation {
    pub fn kind(&self) -> TableChangeKind {
        match self {
            TableOperation::SetSchema { .. } => TableChangeKind::Schema,
            TableOperation::Rename { .. } => TableChangeKind::Name,
            TableOperation::EnableRls(_) => TableChangeKind::RlsEnable,
            TableOperation::ForceRls(_) => TableChangeKind::RlsForced,
            TableOperation::PrimaryKey(_) => TableChangeKind::PrimaryKey,
        }
    }
}

/// How the primary key constraint moves from actual to desired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKeyChange {
    Add(PrimaryKey),
    Drop { name: String },
    /// Same columns, new constraint name
    Rename { from: String, to: String },
    /// Different columns: drop the old constraint, add the new one
    Replace { drop: String, add: PrimaryKey },
}

/// One field-level change inside a grouped column alteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFieldChange {
    Rename {
        from: String,
        to: String,
    },
    DataType {
        from: String,
        to: String,
    },
    Unique {
        enabled: bool,
        /// Constraint to add, or the deployed one to drop
        constraint: String,
    },
    Nullable(bool),
    Default(Option<String>),
    Identity {
        from: Option<IdentityGeneration>,
        to: Option<IdentityGeneration>,
    },
}

impl ColumnFieldChange {
    pub fn kind(&self) -> ColumnChangeKind {
        match self {
            ColumnFieldChange::Rename { .. } => ColumnChangeKind::Name,
            ColumnFieldChange::DataType { .. } => ColumnChangeKind::DataType,
            ColumnFieldChange::Unique { .. } => ColumnChangeKind::Unique,
            ColumnFieldChange::Nullable(_) => ColumnChangeKind::Nullable,
            ColumnFieldChange::Default(_) => ColumnChangeKind::DefaultValue,
            ColumnFieldChange::Identity { .. } => ColumnChangeKind::Identity,
        }
    }
}

/// Every requested field change for one column, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAlteration {
    /// Column name before the first change applies
    pub column: String,
    pub changes: Vec<ColumnFieldChange>,
}

impl ColumnAlteration {
    /// The kinds covered, in application order.
    pub fn kinds(&self) -> Vec<ColumnChangeKind> {
        self.changes.iter().map(ColumnFieldChange::kind).collect()
    }

    /// Position of a kind within the alteration.
    pub fn position(&self, kind: ColumnChangeKind) -> Option<usize> {
        self.changes.iter().position(|c| c.kind() == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOperation {
    Add(Column),
    Drop(String),
    Alter(ColumnAlteration),
}

impl ColumnOperation {
    pub fn kinds(&self) -> Vec<ColumnChangeKind> {
        match self {
            ColumnOperation::Add(_) => vec![ColumnChangeKind::New],
            ColumnOperation::Drop(_) => vec![ColumnChangeKind::Delete],
            ColumnOperation::Alter(alter) => alter.kinds(),
        }
    }
}

/// One relationship-level step. The relationship is the full payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationOperation {
    Create(Relationship),
    Update(Relationship),
    Delete {
        relationship: Relationship,
        keep_index: bool,
    },
    CreateIndex(Relationship),
    ActionOnUpdate(Relationship),
    ActionOnDelete(Relationship),
}

impl RelationOperation {
    pub fn kind(&self) -> RelationChangeKind {
        match self {
            RelationOperation::Create(_) => RelationChangeKind::Create,
            RelationOperation::Update(_) => RelationChangeKind::Update,
            RelationOperation::Delete { .. } => RelationChangeKind::Delete,
            RelationOperation::CreateIndex(_) => RelationChangeKind::CreateIndex,
            RelationOperation::ActionOnUpdate(_) => RelationChangeKind::ActionOnUpdate,
            RelationOperation::ActionOnDelete(_) => RelationChangeKind::ActionOnDelete,
        }
    }

    pub fn relationship(&self) -> &Relationship {
        match self {
            RelationOperation::Create(r)
            | RelationOperation::Update(r)
            | RelationOperation::CreateIndex(r)
            | RelationOperation::ActionOnUpdate(r)
            | RelationOperation::ActionOnDelete(r) => r,
            RelationOperation::Delete { relationship, .. } => relationship,
        }
    }
}

/// A single-attribute change to a role, carrying the desired value.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleOperation {
    ConnectionLimit(i32),
    Rename { from: String, to: String },
    Replication(bool),
    SuperUser(bool),
    Inherit(bool),
    BypassRls(bool),
    CreateRole(bool),
    CreateDb(bool),
    Login(bool),
    ValidUntil(Option<Timestamp>),
    Config(IndexMap<String, ConfigValue>),
}

impl RoleOperation {
    pub fn kind(&self) -> RoleChangeKind {
        match self {
            RoleOperation::ConnectionLimit(_) => RoleChangeKind::ConnectionLimit,
            RoleOperation::Rename { .. } => RoleChangeKind::Name,
            RoleOperation::Replication(_) => RoleChangeKind::IsReplication,
            RoleOperation::SuperUser(_) => RoleChangeKind::IsSuperUser,
            RoleOperation::Inherit(_) => RoleChangeKind::InheritRole,
            RoleOperation::BypassRls(_) => RoleChangeKind::CanBypassRls,
            RoleOperation::CreateRole(_) => RoleChangeKind::CanCreateRole,
            RoleOperation::CreateDb(_) => RoleChangeKind::CanCreateDb,
            RoleOperation::Login(_) => RoleChangeKind::CanLogin,
            RoleOperation::ValidUntil(_) => RoleChangeKind::ValidUntil,
            RoleOperation::Config(_) => RoleChangeKind::Config,
        }
    }
}

/// A single-attribute change to a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOperation {
    Rename { from: String, to: String },
    /// New `WITH CHECK` expression. Without one, Postgres checks rows
    /// against `using`, the policy's current `USING` expression.
    Check {
        check: Option<String>,
        using: String,
    },
    Definition(String),
    /// Full replacement role list; empty means `PUBLIC`
    Roles(Vec<String>),
}

impl PolicyOperation {
    pub fn kind(&self) -> PolicyChangeKind {
        match self {
            PolicyOperation::Rename { .. } => PolicyChangeKind::Name,
            PolicyOperation::Check { .. } => PolicyChangeKind::Check,
            PolicyOperation::Definition(_) => PolicyChangeKind::Definition,
            PolicyOperation::Roles(_) => PolicyChangeKind::Roles,
        }
    }
}

/// A concrete change, ready for an executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateTable(Table),
    DropTable { table: TableRef, cascade: bool },
    Table { table: TableRef, op: TableOperation },
    Column { table: TableRef, op: ColumnOperation },
    Relation { table: TableRef, op: RelationOperation },
    CreateRole(Role),
    DropRole { role: String },
    Role { role: String, op: RoleOperation },
    CreatePolicy(Policy),
    DropPolicy { policy: PolicyRef },
    Policy { policy: PolicyRef, op: PolicyOperation },
}

impl Operation {
    /// Whether re-running this operation after it succeeded would fail or
    /// duplicate work. Executors resuming a partially applied plan must skip
    /// these once they are known to have run.
    pub fn is_exactly_once(&self) -> bool {
        match self {
            Operation::CreateTable(_)
            | Operation::DropTable { .. }
            | Operation::CreateRole(_)
            | Operation::DropRole { .. }
            | Operation::CreatePolicy(_)
            | Operation::DropPolicy { .. } => true,
            Operation::Column { op, .. } => {
                matches!(op, ColumnOperation::Add(_) | ColumnOperation::Drop(_))
            }
            Operation::Relation { op, .. } => matches!(
                op,
                RelationOperation::Create(_) | RelationOperation::Delete { .. }
            ),
            Operation::Table { .. } | Operation::Role { .. } | Operation::Policy { .. } => false,
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateTable(t) => write!(f, "+ table {}", TableRef::of(t)),
            Operation::DropTable { table, cascade } => {
                let cascade = if *cascade { " (cascade)" } else { "" };
                write!(f, "- table {}{}", table, cascade)
            }
            Operation::Table { table, op } => match op {
                TableOperation::SetSchema { from, to } => {
                    write!(f, "~ {} schema: {} -> {}", table, from, to)
                }
                TableOperation::Rename { from, to } => {
                    write!(f, "~ rename {} -> {}", from, to)
                }
                TableOperation::EnableRls(on) => write!(f, "~ {} rls: {}", table, on_off(*on)),
                TableOperation::ForceRls(on) => {
                    write!(f, "~ {} forced rls: {}", table, on_off(*on))
                }
                TableOperation::PrimaryKey(change) => match change {
                    PrimaryKeyChange::Add(pk) => write!(
                        f,
                        "+ {} PRIMARY KEY {} ({})",
                        table,
                        pk.name,
                        pk.columns.join(", ")
                    ),
                    PrimaryKeyChange::Drop { name } => {
                        write!(f, "- {} PRIMARY KEY {}", table, name)
                    }
                    PrimaryKeyChange::Rename { from, to } => {
                        write!(f, "~ {} PRIMARY KEY {} -> {}", table, from, to)
                    }
                    PrimaryKeyChange::Replace { drop, add } => write!(
                        f,
                        "~ {} PRIMARY KEY {} -> {} ({})",
                        table,
                        drop,
                        add.name,
                        add.columns.join(", ")
                    ),
                },
            },
            Operation::Column { table, op } => match op {
                ColumnOperation::Add(col) => {
                    let nullable = if col.nullable { " (nullable)" } else { "" };
                    write!(f, "+ {}.{}: {}{}", table, col.name, col.data_type, nullable)
                }
                ColumnOperation::Drop(name) => write!(f, "- {}.{}", table, name),
                ColumnOperation::Alter(alter) => {
                    let kinds = alter
                        .kinds()
                        .iter()
                        .map(ColumnChangeKind::as_str)
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "~ {}.{} [{}]", table, alter.column, kinds)
                }
            },
            Operation::Relation { table, op } => {
                let rel = op.relationship();
                let sign = match op {
                    RelationOperation::Create(_) | RelationOperation::CreateIndex(_) => '+',
                    RelationOperation::Delete { .. } => '-',
                    _ => '~',
                };
                write!(
                    f,
                    "{} {} {} {} ({}) -> {}.{}.{}",
                    sign,
                    table,
                    op.kind(),
                    rel.constraint_name,
                    rel.source_column,
                    rel.target_schema,
                    rel.target_table,
                    rel.target_column
                )
            }
            Operation::CreateRole(role) => write!(f, "+ role {}", role.name),
            Operation::DropRole { role } => write!(f, "- role {}", role),
            Operation::Role { role, op } => write!(f, "~ role {} {}", role, op.kind()),
            Operation::CreatePolicy(policy) => write!(f, "+ policy {}", PolicyRef::of(policy)),
            Operation::DropPolicy { policy } => write!(f, "- policy {}", policy),
            Operation::Policy { policy, op } => write!(f, "~ policy {} {}", policy, op.kind()),
        }
    }
}

/// An ordered change plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    operations: Vec<Operation>,
}

impl Plan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Returns true if there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Render every operation, one statement per line.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for op in &self.operations {
            sql.push_str(&format!("-- {}\n", op));
            for statement in op.to_sql() {
                sql.push_str(&statement);
                sql.push_str(";\n");
            }
        }
        sql
    }
}

impl IntoIterator for Plan {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operations.is_empty() {
            return write!(f, "No changes.");
        }
        for op in &self.operations {
            writeln!(f, "  {}", op)?;
        }
        Ok(())
    }
}
