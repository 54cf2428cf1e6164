//! Bound values: immediate parameters, deferred computations and call-time arguments.

use crate::error::{FragError, FragResult};
use crate::fragment::{Fragment, Part};
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly, type-erased query parameter.
///
/// Cloning shares the underlying value, so a fragment reused in many parent
/// trees never copies its bound values.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Borrow the value as the trait object `tokio-postgres` expects.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Positional arguments handed to every deferred value at render time.
///
/// Arguments are type-erased; a deferred computation reads them back with
/// [`CallArgs::get`], which reports a missing index or a type mismatch as an
/// error instead of panicking.
#[derive(Default)]
pub struct CallArgs {
    args: Vec<Box<dyn Any + Send + Sync>>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument (consuming version of [`CallArgs::push`]).
    pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.args.push(Box::new(value));
        self
    }

    /// Read argument `index` as a `T`.
    pub fn get<T: Any>(&self, index: usize) -> FragResult<&T> {
        let arg: &(dyn Any + Send + Sync) =
            &**self.args.get(index).ok_or(FragError::MissingArgument {
                index,
                len: self.args.len(),
            })?;
        arg.downcast_ref::<T>().ok_or(FragError::ArgumentType {
            index,
            expected: type_name::<T>(),
        })
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgs")
            .field("len", &self.args.len())
            .finish()
    }
}

type ResolveFn = dyn Fn(&CallArgs) -> FragResult<Param> + Send + Sync;

/// A value computed from [`CallArgs`] each time a fragment's values are requested.
///
/// # Example
/// ```ignore
/// let price = Deferred::new(|args| {
///     let x = *args.get::<i64>(0)?;
///     let y = *args.get::<i64>(1)?;
///     Ok((5 + x) * y)
/// });
/// ```
#[derive(Clone)]
pub struct Deferred(Arc<ResolveFn>);

impl Deferred {
    pub fn new<F, T>(f: F) -> Self
    where
        F: Fn(&CallArgs) -> FragResult<T> + Send + Sync + 'static,
        T: ToSql + Send + Sync + 'static,
    {
        Deferred(Arc::new(move |args| f(args).map(Param::new)))
    }

    /// Invoke the computation.
    pub fn resolve(&self, args: &CallArgs) -> FragResult<Param> {
        (self.0)(args)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(<fn>)")
    }
}

/// A value bound to one placeholder.
#[derive(Clone, Debug)]
pub enum Value {
    /// Known at construction time.
    Immediate(Param),
    /// Resolved from call-time arguments.
    Deferred(Deferred),
}

impl Value {
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Value::Immediate(Param::new(value))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    pub fn as_immediate(&self) -> Option<&Param> {
        match self {
            Value::Immediate(param) => Some(param),
            Value::Deferred(_) => None,
        }
    }

    /// Produce the concrete parameter. Immediate values ignore `args`.
    pub fn resolve(&self, args: &CallArgs) -> FragResult<Param> {
        match self {
            Value::Immediate(param) => Ok(param.clone()),
            Value::Deferred(deferred) => deferred.resolve(args),
        }
    }
}

impl From<Param> for Value {
    fn from(param: Param) -> Self {
        Value::Immediate(param)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Deferred(deferred)
    }
}

/// One interpolated argument: either a sub-fragment spliced into the tree or a
/// value that becomes a placeholder.
///
/// Any `ToSql` value converts into `Arg::Value`, so builders accept plain Rust
/// values and fragments through the same `impl Into<Arg>` parameter.
#[derive(Clone, Debug)]
pub enum Arg {
    Fragment(Fragment),
    Value(Value),
}

impl Arg {
    /// Append this argument to a part list.
    ///
    /// Fragments are nested as-is; values become a placeholder plus one entry
    /// in `values`.
    pub(crate) fn push_into(self, parts: &mut Vec<Part>, values: &mut Vec<Value>) {
        match self {
            Arg::Fragment(fragment) => parts.push(Part::Fragment(fragment)),
            Arg::Value(value) => {
                parts.push(Part::Placeholder);
                values.push(value);
            }
        }
    }
}

impl From<Fragment> for Arg {
    fn from(fragment: Fragment) -> Self {
        Arg::Fragment(fragment)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<Param> for Arg {
    fn from(param: Param) -> Self {
        Arg::Value(Value::Immediate(param))
    }
}

impl From<Deferred> for Arg {
    fn from(deferred: Deferred) -> Self {
        Arg::Value(Value::Deferred(deferred))
    }
}

impl<T> From<T> for Arg
where
    T: ToSql + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Arg::Value(Value::new(value))
    }
}
