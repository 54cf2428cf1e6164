//! Identifier and literal escaping.
//!
//! [`Escaper`] is the seam between fragments and the quoting rules of the
//! target database. [`PgEscaper`] implements PostgreSQL's rules:
//!
//! - Identifiers matching `[a-z_][a-z0-9_$]*` that are not reserved keywords
//!   are emitted bare; anything else is wrapped in `"` with `"` doubled.
//! - Literals are wrapped in `'` with `'` doubled. If the text contains a
//!   backslash, backslashes are doubled and the literal gets an `E` prefix so
//!   it reads the same whatever `standard_conforming_strings` is set to.
//!
//! # Example
//! ```ignore
//! use sqlfrag::{Escaper, PgEscaper};
//!
//! assert_eq!(PgEscaper.escape_identifier("users")?, "users");
//! assert_eq!(PgEscaper.escape_identifier("user")?, r#""user""#);
//! assert_eq!(PgEscaper.escape_literal("it's")?, "'it''s'");
//! # Ok::<(), sqlfrag::FragError>(())
//! ```

use crate::error::{FragError, FragResult};

/// Quotes raw identifiers and literals for safe inclusion as SQL text.
pub trait Escaper {
    fn escape_identifier(&self, raw: &str) -> FragResult<String>;
    fn escape_literal(&self, raw: &str) -> FragResult<String>;
}

impl<E: Escaper + ?Sized> Escaper for &E {
    fn escape_identifier(&self, raw: &str) -> FragResult<String> {
        (**self).escape_identifier(raw)
    }

    fn escape_literal(&self, raw: &str) -> FragResult<String> {
        (**self).escape_literal(raw)
    }
}

/// PostgreSQL escaping rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgEscaper;

impl Escaper for PgEscaper {
    fn escape_identifier(&self, raw: &str) -> FragResult<String> {
        if raw.is_empty() {
            return Err(FragError::escape("Identifier cannot be empty"));
        }
        if raw.contains('\0') {
            return Err(FragError::escape(
                "Identifier cannot contain NUL character",
            ));
        }
        if is_bare_ident(raw) && !is_reserved(raw) {
            return Ok(raw.to_string());
        }

        let mut out = String::with_capacity(raw.len() + 2);
        out.push('"');
        for ch in raw.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
        Ok(out)
    }

    fn escape_literal(&self, raw: &str) -> FragResult<String> {
        if raw.contains('\0') {
            return Err(FragError::escape("Literal cannot contain NUL character"));
        }

        let has_backslash = raw.contains('\\');
        let mut out = String::with_capacity(raw.len() + 3);
        if has_backslash {
            out.push('E');
        }
        out.push('\'');
        for ch in raw.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
        Ok(out)
    }
}

/// `[a-z_][a-z0-9_$]*`: names PostgreSQL would not case-fold or misparse.
fn is_bare_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn is_reserved(s: &str) -> bool {
    RESERVED_KEYWORDS.binary_search_by(|k| (*k).cmp(s)).is_ok()
}

/// PostgreSQL keywords that cannot be used as bare column or table names.
/// Sorted for binary search.
const RESERVED_KEYWORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];
