//! Entity types for tidepool.
//!
//! Everything in here is a plain value: a snapshot of a table, role or policy,
//! either declared locally (the desired state) or read back from the remote
//! service (the actual state). The planner in `tidepool` only ever reads these.

use indexmap::IndexMap;
use jiff::Timestamp;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing one of the closed model enums from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// What was being parsed (e.g. "identity generation").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

/// How an identity column generates its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityGeneration {
    /// `GENERATED BY DEFAULT AS IDENTITY`
    ByDefault,
    /// `GENERATED ALWAYS AS IDENTITY`
    Always,
}

impl IdentityGeneration {
    /// The SQL keyword(s) for this mode.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IdentityGeneration::ByDefault => "BY DEFAULT",
            IdentityGeneration::Always => "ALWAYS",
        }
    }
}

impl fmt::Display for IdentityGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for IdentityGeneration {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BY DEFAULT" => Ok(IdentityGeneration::ByDefault),
            "ALWAYS" => Ok(IdentityGeneration::Always),
            _ => Err(ParseEnumError::new("identity generation", s)),
        }
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Postgres type name, as written (e.g. `text`, `json`, `int8`)
    pub data_type: String,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Default value literal or expression (opaque)
    pub default: Option<String>,
    /// Whether the column carries a single-column unique constraint
    pub unique: bool,
    /// Identity generation mode, `None` when the column is not an identity column
    pub identity: Option<IdentityGeneration>,
}

impl Column {
    /// A nullable column with no default, no constraints.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            unique: false,
            identity: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn identity(mut self, generation: IdentityGeneration) -> Self {
        self.identity = Some(generation);
        self
    }

    /// Whether this is an identity column.
    pub fn is_identity(&self) -> bool {
        self.identity.is_some()
    }
}

/// Referential action of a foreign key, as stored in `pg_constraint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse the single-letter catalog code (`confupdtype` / `confdeltype`).
    pub fn from_code(code: &str) -> Result<Self, ParseEnumError> {
        match code {
            "a" => Ok(ReferentialAction::NoAction),
            "r" => Ok(ReferentialAction::Restrict),
            "c" => Ok(ReferentialAction::Cascade),
            "n" => Ok(ReferentialAction::SetNull),
            "d" => Ok(ReferentialAction::SetDefault),
            _ => Err(ParseEnumError::new("referential action code", code)),
        }
    }

    /// The single-letter catalog code.
    pub fn code(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "a",
            ReferentialAction::Restrict => "r",
            ReferentialAction::Cascade => "c",
            ReferentialAction::SetNull => "n",
            ReferentialAction::SetDefault => "d",
        }
    }

    /// The SQL spelling, as used after `ON UPDATE` / `ON DELETE`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The on-update / on-delete pair of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RelationAction {
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

impl RelationAction {
    pub fn new(on_update: ReferentialAction, on_delete: ReferentialAction) -> Self {
        Self {
            on_update,
            on_delete,
        }
    }

    /// Build from the catalog codes, e.g. `("c", "n")`.
    pub fn from_codes(on_update: &str, on_delete: &str) -> Result<Self, ParseEnumError> {
        Ok(Self {
            on_update: ReferentialAction::from_code(on_update)?,
            on_delete: ReferentialAction::from_code(on_delete)?,
        })
    }
}

/// An index, as reported by `pg_indexes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Index {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Raw definition (`CREATE INDEX ...`)
    pub definition: String,
}

/// A foreign key from one column to another.
///
/// An empty `constraint_name` means "generate one"; see
/// `tidepool_sql::relation_constraint_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Relationship {
    pub constraint_name: String,
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    /// On-update / on-delete actions, when known
    pub action: Option<RelationAction>,
    /// Supporting index owned by this relationship
    pub index: Option<Index>,
}

impl Relationship {
    /// Whether the caller left the constraint name for the planner to derive.
    pub fn needs_generated_name(&self) -> bool {
        self.constraint_name.trim().is_empty()
    }
}

/// A primary key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PrimaryKey {
    /// Constraint name
    pub name: String,
    /// Covered columns, in key order
    pub columns: Vec<String>,
}

impl PrimaryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn on<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Schema name
    pub schema: String,
    /// Table name
    pub name: String,
    /// Columns, in declaration order
    pub columns: Vec<Column>,
    /// Foreign keys declared on this table
    pub relationships: Vec<Relationship>,
    /// Primary key constraints (at most one is valid)
    pub primary_keys: Vec<PrimaryKey>,
    /// Row level security enabled
    pub rls_enabled: bool,
    /// Row level security forced for the table owner
    pub rls_forced: bool,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The active primary key, if any.
    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_keys.first()
    }

    /// Names that appear more than once in `columns`.
    pub fn duplicate_columns(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut dupes = Vec::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) && !dupes.contains(&col.name.as_str()) {
                dupes.push(col.name.as_str());
            }
        }
        dupes
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Connection limit meaning "no limit".
pub const UNLIMITED_CONNECTIONS: i32 = -1;

/// A scalar role configuration value (`ALTER ROLE ... SET key = value`).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

/// A database role.
///
/// Equality ignores the order of `config` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub name: String,
    pub can_login: bool,
    pub is_superuser: bool,
    pub is_replication: bool,
    pub can_create_role: bool,
    pub can_create_db: bool,
    pub inherit_role: bool,
    pub can_bypass_rls: bool,
    /// Maximum concurrent connections, [`UNLIMITED_CONNECTIONS`] for no limit
    pub connection_limit: i32,
    pub valid_until: Option<Timestamp>,
    pub config: IndexMap<String, ConfigValue>,
}

impl Default for Role {
    fn default() -> Self {
        Self {
            name: String::new(),
            can_login: false,
            is_superuser: false,
            is_replication: false,
            can_create_role: false,
            can_create_db: false,
            inherit_role: true,
            can_bypass_rls: false,
            connection_limit: UNLIMITED_CONNECTIONS,
            valid_until: None,
            config: IndexMap::new(),
        }
    }
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Policies
// =============================================================================

/// The command a row level security policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolicyCommand {
    #[default]
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyCommand {
    pub fn as_sql(&self) -> &'static str {
        match self {
            PolicyCommand::All => "ALL",
            PolicyCommand::Select => "SELECT",
            PolicyCommand::Insert => "INSERT",
            PolicyCommand::Update => "UPDATE",
            PolicyCommand::Delete => "DELETE",
        }
    }
}

impl fmt::Display for PolicyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for PolicyCommand {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(PolicyCommand::All),
            "SELECT" => Ok(PolicyCommand::Select),
            "INSERT" => Ok(PolicyCommand::Insert),
            "UPDATE" => Ok(PolicyCommand::Update),
            "DELETE" => Ok(PolicyCommand::Delete),
            _ => Err(ParseEnumError::new("policy command", s)),
        }
    }
}

/// A row level security policy.
///
/// Role order is kept for display, but two policies with the same roles in a
/// different order are equal.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub name: String,
    pub schema: String,
    pub table: String,
    pub command: PolicyCommand,
    /// The `USING` expression
    pub definition: String,
    /// The `WITH CHECK` expression
    pub check: Option<String>,
    pub roles: Vec<String>,
}

impl Policy {
    /// The role names in sorted order, duplicates kept.
    pub fn sorted_roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self.roles.iter().map(String::as_str).collect();
        roles.sort_unstable();
        roles
    }
}

impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.schema == other.schema
            && self.table == other.table
            && self.command == other.command
            && self.definition == other.definition
            && self.check == other.check
            && self.sorted_roles() == other.sorted_roles()
    }
}

impl Eq for Policy {}

// =============================================================================
// Projects
// =============================================================================

/// A hosted project, as returned by project discovery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    pub id: String,
    pub name: String,
}
