//! SQL quoting and naming helpers.
//!
//! Every name the planner fills in on the caller's behalf is produced here, as
//! a pure function of its inputs, so planning the same request twice yields
//! the same names.

/// Longest identifier Postgres keeps before truncating (NAMEDATALEN - 1).
pub const PG_IDENT_MAX: usize = 63;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use tidepool_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use tidepool_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, so names like `some-table` or `user` survive as written.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Quote a schema-qualified name. An empty schema yields just the quoted name.
///
/// ```
/// use tidepool_sql::qualified_name;
/// assert_eq!(qualified_name("public", "post"), "\"public\".\"post\"");
/// assert_eq!(qualified_name("", "post"), "\"post\"");
/// ```
pub fn qualified_name(schema: &str, name: &str) -> String {
    if schema.is_empty() {
        quote_ident(name)
    } else {
        format!("{}.{}", Ident(schema), Ident(name))
    }
}

/// Generate the constraint name for a foreign key that was declared without one.
///
/// Uses `{schema}_{table}_{column}_fkey`, skipping empty parts. Names longer
/// than [`PG_IDENT_MAX`] are shortened with a stable hash suffix so two long
/// names never collapse into the same truncated prefix.
///
/// ```
/// use tidepool_sql::relation_constraint_name;
/// assert_eq!(
///     relation_constraint_name("public", "post", "author_id"),
///     "public_post_author_id_fkey"
/// );
/// assert_eq!(
///     relation_constraint_name("some-schema", "", "some-column"),
///     "some-schema_some-column_fkey"
/// );
/// ```
pub fn relation_constraint_name(schema: &str, table: &str, column: &str) -> String {
    let base = [schema, table, column]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_");
    fit_identifier(&base, "_fkey")
}

/// Postgres' default name for a single-column unique constraint.
///
/// ```
/// assert_eq!(tidepool_sql::unique_constraint_name("user", "email"), "user_email_key");
/// ```
pub fn unique_constraint_name(table: &str, column: &str) -> String {
    fit_identifier(&format!("{}_{}", table, column), "_key")
}

/// Postgres' default name for a primary key constraint.
///
/// ```
/// assert_eq!(tidepool_sql::primary_key_name("user"), "user_pkey");
/// ```
pub fn primary_key_name(table: &str) -> String {
    fit_identifier(table, "_pkey")
}

/// Human-readable policy name for a resource/action pair.
///
/// ```
/// assert_eq!(
///     tidepool_sql::policy_name("reader", "post", "select"),
///     "enable reader access for post select"
/// );
/// ```
pub fn policy_name(name: &str, resource: &str, action: &str) -> String {
    format!("enable {} access for {} {}", name, resource, action)
}

/// Join `stem` and `suffix`, shortening the stem when the result would not fit
/// in a Postgres identifier.
fn fit_identifier(stem: &str, suffix: &str) -> String {
    if stem.len() + suffix.len() <= PG_IDENT_MAX {
        return format!("{}{}", stem, suffix);
    }

    let hex = blake3::hash(stem.as_bytes()).to_hex().to_string();
    let hash = &hex[..8];

    // stem_part + "_" + hash + suffix
    let max_stem_len = PG_IDENT_MAX.saturating_sub(1 + hash.len() + suffix.len());
    let mut len = max_stem_len.min(stem.len());
    while len > 0 && !stem.is_char_boundary(len) {
        len -= 1;
    }

    format!("{}_{}{}", &stem[..len], hash, suffix)
}
