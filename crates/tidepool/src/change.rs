//! Change kinds: the closed vocabulary callers use to say which differences
//! between desired and actual state they want acted on.
//!
//! Every kind has a stable snake_case name. `FromStr` only accepts those
//! names, so a typo in a declaration is rejected when the request is built
//! rather than when the plan runs.

use std::fmt;
use std::str::FromStr;

/// Error returned when a change kind name is not part of its vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} change kind {value:?}")]
pub struct ParseKindError {
    pub vocabulary: &'static str,
    pub value: String,
}

macro_rules! change_kinds {
    (
        $(#[$meta:meta])*
        $name:ident ($vocabulary:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every kind in this vocabulary, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Stable textual name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseKindError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(ParseKindError {
                        vocabulary: $vocabulary,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

change_kinds! {
    /// What can change about a single column.
    ColumnChangeKind ("column") {
        /// Rename the column
        Name => "name",
        /// Change the column type
        DataType => "data_type",
        /// Add or drop the single-column unique constraint
        Unique => "unique",
        /// Set or drop NOT NULL
        Nullable => "nullable",
        /// Set or drop the default expression
        DefaultValue => "default_value",
        /// Add, drop or change identity generation
        Identity => "identity",
        /// The column does not exist yet
        New => "new",
        /// The column must be dropped
        Delete => "delete",
    }
}

impl ColumnChangeKind {
    /// Whether this kind alters an existing column (as opposed to adding or dropping one).
    pub fn is_modification(&self) -> bool {
        !matches!(self, ColumnChangeKind::New | ColumnChangeKind::Delete)
    }
}

change_kinds! {
    /// What can change about a table as a whole.
    TableChangeKind ("table") {
        Schema => "schema",
        Name => "name",
        RlsEnable => "rls_enable",
        RlsForced => "rls_forced",
        PrimaryKey => "primary_key",
    }
}

change_kinds! {
    /// What can happen to a foreign key relationship.
    RelationChangeKind ("relation") {
        Create => "create",
        Update => "update",
        Delete => "delete",
        CreateIndex => "create_index",
        ActionOnUpdate => "action_on_update",
        ActionOnDelete => "action_on_delete",
    }
}

change_kinds! {
    /// What can change about a role.
    RoleChangeKind ("role") {
        ConnectionLimit => "connection_limit",
        Name => "name",
        IsReplication => "is_replication",
        IsSuperUser => "is_super_user",
        InheritRole => "inherit_role",
        CanBypassRls => "can_bypass_rls",
        CanCreateRole => "can_create_role",
        CanCreateDb => "can_create_db",
        CanLogin => "can_login",
        ValidUntil => "valid_until",
        Config => "config",
    }
}

change_kinds! {
    /// What can change about a row level security policy.
    PolicyChangeKind ("policy") {
        Name => "name",
        Check => "check",
        Definition => "definition",
        Roles => "roles",
    }
}
