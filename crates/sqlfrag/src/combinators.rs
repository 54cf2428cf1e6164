//! Composition helpers built on [`Fragment`].
//!
//! Every function here returns a new fragment and leaves its inputs untouched.
//! Nested fragments are shared, not copied.

use crate::error::FragResult;
use crate::escape::{Escaper, PgEscaper};
use crate::fragment::{Fragment, Part};
use crate::value::Arg;
use std::fmt;
use std::ops;

/// Insert `value` verbatim as SQL text.
///
/// **No escaping is applied.** Only use this for text you fully control.
pub fn unsafe_raw(value: impl fmt::Display) -> Fragment {
    Fragment::text(value.to_string())
}

/// Like [`unsafe_raw`], but `None` becomes empty text.
pub fn unsafe_raw_opt<T: fmt::Display>(value: Option<T>) -> Fragment {
    match value {
        Some(value) => unsafe_raw(value),
        None => Fragment::text(""),
    }
}

/// An identifier quoted with [`PgEscaper`].
pub fn ident(value: &str) -> FragResult<Fragment> {
    ident_with(&PgEscaper, value)
}

/// A string literal quoted with [`PgEscaper`].
pub fn literal(value: &str) -> FragResult<Fragment> {
    literal_with(&PgEscaper, value)
}

pub fn ident_with<E: Escaper + ?Sized>(escaper: &E, value: &str) -> FragResult<Fragment> {
    Ok(Fragment::text(escaper.escape_identifier(value)?))
}

pub fn literal_with<E: Escaper + ?Sized>(escaper: &E, value: &str) -> FragResult<Fragment> {
    Ok(Fragment::text(escaper.escape_literal(value)?))
}

/// Join items with `separator` between consecutive elements.
///
/// Fragments are nested; any other item is bound as a value. An empty input
/// yields an empty fragment.
pub fn join<A: Into<Arg>>(items: impl IntoIterator<Item = A>, separator: &str) -> Fragment {
    let mut parts = Vec::new();
    let mut values = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            parts.push(Part::text(separator));
        }
        item.into().push_into(&mut parts, &mut values);
    }
    Fragment::from_parts_unchecked(parts, values)
}

/// [`join`] with a single space.
pub fn join_default<A: Into<Arg>>(items: impl IntoIterator<Item = A>) -> Fragment {
    join(items, " ")
}

/// `a AND b AND ...`
pub fn and<A: Into<Arg>>(items: impl IntoIterator<Item = A>) -> Fragment {
    join(items, " AND ")
}

/// `a OR b OR ...`
pub fn or<A: Into<Arg>>(items: impl IntoIterator<Item = A>) -> Fragment {
    join(items, " OR ")
}

/// `a, b, ...`
pub fn comma<A: Into<Arg>>(items: impl IntoIterator<Item = A>) -> Fragment {
    join(items, ", ")
}

/// Wrap each fragment in parentheses.
pub fn parenthesize_all(items: impl IntoIterator<Item = Fragment>) -> Vec<Fragment> {
    items.into_iter().map(|f| f.parenthesize()).collect()
}

/// `a b`: both fragments under a new parent, separated by one space.
pub fn concat(a: &Fragment, b: &Fragment) -> Fragment {
    a.concat(b)
}

impl Fragment {
    /// `(self)`
    pub fn parenthesize(&self) -> Fragment {
        Fragment::from_parts_unchecked(
            vec![
                Part::text("("),
                Part::Fragment(self.clone()),
                Part::text(")"),
            ],
            Vec::new(),
        )
    }

    /// `NOT self`
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Fragment {
        Fragment::from_parts_unchecked(
            vec![Part::text("NOT "), Part::Fragment(self.clone())],
            Vec::new(),
        )
    }

    /// `self other`, nesting both under a new parent.
    pub fn concat(&self, other: &Fragment) -> Fragment {
        Fragment::from_parts_unchecked(
            vec![
                Part::Fragment(self.clone()),
                Part::text(" "),
                Part::Fragment(other.clone()),
            ],
            Vec::new(),
        )
    }
}

impl ops::Not for Fragment {
    type Output = Fragment;

    fn not(self) -> Fragment {
        Fragment::not(&self)
    }
}

impl ops::Not for &Fragment {
    type Output = Fragment;

    fn not(self) -> Fragment {
        Fragment::not(self)
    }
}
