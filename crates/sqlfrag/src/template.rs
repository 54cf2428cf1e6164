//! Fragment construction from interleaved text and arguments.
//!
//! Three front-ends produce the same tree shape `[T0, X0, T1, X1, ..., Tn]`:
//! - [`Fragment::build`]: explicit text segments and arguments.
//! - [`Template`] and the [`sql!`](crate::sql!) macro: push text and arguments in order.
//! - [`Fragment::format`]: a format string with `%v` directives.
//!
//! Each argument is either a [`Fragment`] (nested, no placeholder at this level)
//! or a value (replaced by a placeholder). Values are never evaluated or escaped here.

use crate::error::{FragError, FragResult};
use crate::fragment::{Fragment, Part};
use crate::value::{Arg, Deferred, Value};
use tokio_postgres::types::ToSql;

fn assemble(texts: Vec<String>, args: Vec<Arg>) -> Fragment {
    debug_assert_eq!(texts.len(), args.len() + 1);
    let mut parts = Vec::with_capacity(texts.len() + args.len());
    let mut values = Vec::new();
    let mut texts = texts.into_iter();
    if let Some(first) = texts.next() {
        parts.push(Part::Text(first));
    }
    for (arg, text) in args.into_iter().zip(texts) {
        arg.push_into(&mut parts, &mut values);
        parts.push(Part::Text(text));
    }
    Fragment::from_parts_unchecked(parts, values)
}

impl Fragment {
    /// Build a fragment from `n + 1` text segments and `n` arguments.
    ///
    /// # Example
    /// ```ignore
    /// let f = Fragment::build(["SELECT * FROM foo WHERE id = ", ""], [5])?;
    /// assert_eq!(f.query(), "SELECT * FROM foo WHERE id = $1");
    /// ```
    pub fn build<S, A>(
        texts: impl IntoIterator<Item = S>,
        args: impl IntoIterator<Item = A>,
    ) -> FragResult<Fragment>
    where
        S: Into<String>,
        A: Into<Arg>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        let args: Vec<Arg> = args.into_iter().map(Into::into).collect();
        if texts.len() != args.len() + 1 {
            return Err(FragError::template(format!(
                "expected {} text segments for {} arguments, got {}",
                args.len() + 1,
                args.len(),
                texts.len()
            )));
        }
        Ok(assemble(texts, args))
    }

    /// Build a fragment from a format string.
    ///
    /// `%v` takes the next argument (a fragment is nested, anything else is
    /// bound as a value); `%%` is a literal `%`. The number of `%v` directives
    /// must match the number of arguments.
    ///
    /// # Example
    /// ```ignore
    /// let f = Fragment::format("SELECT * FROM foo WHERE id = %v AND pct > 50%%", [5])?;
    /// assert_eq!(f.query(), "SELECT * FROM foo WHERE id = $1 AND pct > 50%");
    /// ```
    pub fn format<A: Into<Arg>>(
        fmt: &str,
        args: impl IntoIterator<Item = A>,
    ) -> FragResult<Fragment> {
        let mut args = args.into_iter().map(Into::into);
        let mut template = Template::new();
        let mut used = 0usize;
        let mut rest = fmt;

        while let Some(pos) = rest.find('%') {
            template.push(&rest[..pos]);
            let directive = &rest[pos + 1..];
            match directive.chars().next() {
                None => return Err(FragError::template("format string ends with %")),
                Some('%') => {
                    template.push("%");
                }
                Some('v') => {
                    let arg = args.next().ok_or_else(|| {
                        FragError::template(format!(
                            "format string has more %v directives than the {used} arguments given"
                        ))
                    })?;
                    template.push_arg(arg);
                    used += 1;
                }
                Some(c) => {
                    return Err(FragError::template(format!(
                        "unknown format directive %{c}"
                    )));
                }
            }
            // Both accepted directives are a single ASCII byte.
            rest = &directive[1..];
        }
        template.push(rest);

        if args.next().is_some() {
            return Err(FragError::template(format!(
                "format string has {used} %v directives but more arguments were given"
            )));
        }
        Ok(template.finish())
    }
}

/// An incremental fragment builder.
///
/// Text and arguments may be pushed in any order: adjacent texts are merged
/// and adjacent arguments get an empty text between them, so the result is
/// always well formed.
///
/// # Example
/// ```ignore
/// let mut t = Template::new();
/// t.push("SELECT * FROM users WHERE status = ").push_bind("active");
/// if let Some(min_age) = min_age {
///     t.push(" AND age >= ").push_bind(min_age);
/// }
/// let f = t.finish();
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct Template {
    texts: Vec<String>,
    args: Vec<Arg>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal SQL text.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if self.texts.len() > self.args.len() {
            if let Some(last) = self.texts.last_mut() {
                last.push_str(sql);
            }
        } else {
            self.texts.push(sql.to_string());
        }
        self
    }

    /// Append an argument: a nested fragment or a bound value.
    pub fn push_arg(&mut self, arg: impl Into<Arg>) -> &mut Self {
        if self.texts.len() == self.args.len() {
            self.texts.push(String::new());
        }
        self.args.push(arg.into());
        self
    }

    /// Append a placeholder bound to `value`.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.push_arg(Value::new(value))
    }

    /// Append a placeholder whose value is computed from call-time arguments.
    pub fn push_deferred(&mut self, deferred: Deferred) -> &mut Self {
        self.push_arg(deferred)
    }

    /// Nest another fragment at this position.
    pub fn push_fragment(&mut self, fragment: &Fragment) -> &mut Self {
        self.push_arg(fragment.clone())
    }

    pub fn finish(mut self) -> Fragment {
        if self.texts.len() == self.args.len() {
            self.texts.push(String::new());
        }
        assemble(self.texts, self.args)
    }
}

/// Build a [`Fragment`] template-style.
///
/// String literals are SQL text; `{expr}` groups are interpolated arguments
/// (fragments are nested, everything else is bound as a value).
///
/// # Example
/// ```ignore
/// use sqlfrag::sql;
///
/// let cond = sql!("name = " {name});
/// let q = sql!("SELECT * FROM users WHERE id = " {id} " AND " {cond});
/// ```
#[macro_export]
macro_rules! sql {
    ($($tt:tt)*) => {{
        #[allow(unused_mut)]
        let mut template = $crate::Template::new();
        $crate::__sql_push!(template; $($tt)*);
        template.finish()
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sql_push {
    ($t:ident;) => {};
    ($t:ident; $text:literal $($rest:tt)*) => {
        $t.push($text);
        $crate::__sql_push!($t; $($rest)*);
    };
    ($t:ident; { $arg:expr } $($rest:tt)*) => {
        $t.push_arg($arg);
        $crate::__sql_push!($t; $($rest)*);
    };
}
