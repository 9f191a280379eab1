//! Identifier quoting.
//!
//! Every identifier segment is wrapped in double quotes with embedded `"` doubled:
//!
//! - `str` -> `"str"`
//! - `example.str` -> `"example"."str"`
//! - `example as e` -> `"example" as "e"`
//! - `*` and `table.*` keep the star unquoted
//!
//! No validation happens here: a malformed identifier reaches the database as-is and
//! fails there.

/// Quote a single identifier segment.
pub fn wrap_value(segment: &str) -> String {
    if segment == "*" {
        return segment.to_string();
    }
    format!("\"{}\"", segment.replace('"', "\"\""))
}

/// Split `value as alias` (case-insensitive `as`), if present.
pub fn split_alias(value: &str) -> Option<(&str, &str)> {
    let lower = value.to_ascii_lowercase();
    let pos = lower.find(" as ")?;
    Some((value[..pos].trim(), value[pos + 4..].trim()))
}

/// Quote a possibly dotted and possibly aliased column reference.
pub fn wrap(value: &str) -> String {
    wrap_prefixed(value, "")
}

/// Like [`wrap`], with `prefix` applied to the table segment of a qualified column
/// (`users.id` -> `"app_users"."id"`).
pub fn wrap_prefixed(value: &str, prefix: &str) -> String {
    if let Some((name, alias)) = split_alias(value) {
        return format!("{} as {}", wrap_prefixed(name, prefix), wrap_value(alias));
    }
    match value.rsplit_once('.') {
        Some((table, column)) => format!("{}.{}", wrap_table(table, prefix), wrap_value(column)),
        None => wrap_value(value),
    }
}

fn wrap_segments(value: &str) -> String {
    value
        .split('.')
        .map(wrap_value)
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a table reference, applying `prefix` to the table name and alias.
pub fn wrap_table(table: &str, prefix: &str) -> String {
    if let Some((name, alias)) = split_alias(table) {
        return format!(
            "{} as {}",
            wrap_table(name, prefix),
            wrap_value(&format!("{prefix}{alias}"))
        );
    }
    match table.rsplit_once('.') {
        Some((schema, name)) => {
            let name = wrap_value(&format!("{prefix}{name}"));
            format!("{}.{}", wrap_segments(schema), name)
        }
        None => wrap_value(&format!("{prefix}{table}")),
    }
}

/// Quote and comma-join a column list.
pub fn columnize<S: AsRef<str>>(columns: &[S]) -> String {
    columnize_prefixed(columns, "")
}

pub fn columnize_prefixed<S: AsRef<str>>(columns: &[S], prefix: &str) -> String {
    columns
        .iter()
        .map(|c| wrap_prefixed(c.as_ref(), prefix))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The alias a table reference is known by (`example as e` -> `e`).
pub fn table_alias(table: &str) -> &str {
    split_alias(table).map_or(table, |(_, alias)| alias)
}
