//! The fragment tree and its render engine.
//!
//! A [`Fragment`] is an immutable node holding literal SQL text, nested
//! fragments and value placeholders. Rendering walks the tree once, numbers
//! every placeholder `$1, $2, ...` from left to right and collects the bound
//! values in the same order.
//!
//! # Example
//!
//! ```ignore
//! use sqlfrag::{Fragment, and};
//!
//! let by_id = Fragment::build(["id = ", ""], [5])?;
//! let by_name = Fragment::build(["name = ", ""], ["hi"])?;
//! let q = Fragment::build(["SELECT * FROM foo WHERE ", ""], [and([by_id, by_name])])?;
//!
//! assert_eq!(q.query(), "SELECT * FROM foo WHERE id = $1 AND name = $2");
//! assert_eq!(q.values()?.len(), 2);
//! ```

use crate::error::{FragError, FragResult};
use crate::query::Query;
use crate::value::{CallArgs, Param, Value};
use std::fmt::{self, Write as _};
use std::slice;
use std::sync::{Arc, OnceLock};

#[cfg(test)]
mod tests;

/// One element of a fragment's part list.
#[derive(Clone, Debug)]
pub enum Part {
    /// Literal SQL text, emitted verbatim.
    Text(String),
    /// A nested fragment, spliced in at this position.
    Fragment(Fragment),
    /// A bound value goes here; the value itself lives in the owning
    /// fragment's value list.
    Placeholder,
}

impl Part {
    pub fn text(sql: impl Into<String>) -> Self {
        Part::Text(sql.into())
    }
}

/// An immutable, shareable piece of parameterized SQL.
///
/// Cloning is cheap: clones share the same node, including its memoized render.
#[derive(Clone)]
pub struct Fragment(Arc<Node>);

struct Node {
    parts: Vec<Part>,
    values: Vec<Value>,
    rendered: OnceLock<Rendered>,
}

impl Drop for Node {
    // Unlink uniquely-owned children iteratively so dropping a deep tree
    // does not recurse once per level.
    fn drop(&mut self) {
        let mut stack: Vec<Fragment> = Vec::new();
        take_children(&mut self.parts, &mut stack);
        while let Some(fragment) = stack.pop() {
            if let Some(mut node) = Arc::into_inner(fragment.0) {
                take_children(&mut node.parts, &mut stack);
            }
        }
    }
}

fn take_children(parts: &mut Vec<Part>, out: &mut Vec<Fragment>) {
    out.extend(std::mem::take(parts).into_iter().filter_map(|part| match part {
        Part::Fragment(child) => Some(child),
        _ => None,
    }));
}

struct Rendered {
    sql: String,
    values: Vec<Value>,
    has_deferred: bool,
}

/// A flattened element: text borrowed from some node, or an unnumbered placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Placeholder,
}

impl Fragment {
    /// Assemble a fragment from an explicit part/value pair.
    ///
    /// This bypasses escaping entirely: text parts are emitted as-is. The only
    /// check is that there is exactly one value per [`Part::Placeholder`].
    pub fn from_parts(parts: Vec<Part>, values: Vec<Value>) -> FragResult<Self> {
        let placeholders = parts
            .iter()
            .filter(|p| matches!(p, Part::Placeholder))
            .count();
        if placeholders != values.len() {
            return Err(FragError::PlaceholderMismatch {
                placeholders,
                values: values.len(),
            });
        }
        Ok(Self::from_parts_unchecked(parts, values))
    }

    pub(crate) fn from_parts_unchecked(parts: Vec<Part>, values: Vec<Value>) -> Self {
        debug_assert_eq!(
            parts
                .iter()
                .filter(|p| matches!(p, Part::Placeholder))
                .count(),
            values.len()
        );
        Fragment(Arc::new(Node {
            parts,
            values,
            rendered: OnceLock::new(),
        }))
    }

    /// A fragment with no parts. Renders as `""`.
    pub fn empty() -> Self {
        Self::from_parts_unchecked(Vec::new(), Vec::new())
    }

    /// A fragment holding a single piece of literal SQL.
    pub fn text(sql: impl Into<String>) -> Self {
        Self::from_parts_unchecked(vec![Part::text(sql)], Vec::new())
    }

    /// This node's own parts (not flattened).
    pub fn parts(&self) -> &[Part] {
        &self.0.parts
    }

    /// This node's own values, one per [`Part::Placeholder`] in [`Fragment::parts`].
    pub fn raw_values(&self) -> &[Value] {
        &self.0.values
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(a: &Fragment, b: &Fragment) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn is_empty(&self) -> bool {
        self.query().is_empty()
    }

    fn iters(&self) -> (slice::Iter<'_, Part>, slice::Iter<'_, Value>) {
        (self.0.parts.iter(), self.0.values.iter())
    }

    /// Depth-first, in-order walk of the tree into caller-supplied accumulators.
    ///
    /// Iterative so that long `concat` chains cannot exhaust the call stack.
    pub(crate) fn flatten_into<'a>(
        &'a self,
        segments: &mut Vec<Segment<'a>>,
        values: &mut Vec<&'a Value>,
    ) {
        let mut stack = vec![self.iters()];
        while let Some((parts, node_values)) = stack.last_mut() {
            match parts.next() {
                None => {
                    stack.pop();
                }
                Some(Part::Text(text)) => segments.push(Segment::Text(text)),
                Some(Part::Placeholder) => {
                    // Construction guarantees one value per placeholder.
                    if let Some(value) = node_values.next() {
                        segments.push(Segment::Placeholder);
                        values.push(value);
                    }
                }
                Some(Part::Fragment(child)) => stack.push(child.iters()),
            }
        }
    }

    /// Build an equivalent fragment with no nesting.
    ///
    /// Every maximal run of adjacent text is merged into one [`Part::Text`];
    /// placeholders stay unnumbered and values keep traversal order.
    pub fn flatten(&self) -> Fragment {
        let mut segments = Vec::new();
        let mut values = Vec::new();
        self.flatten_into(&mut segments, &mut values);

        let mut parts = Vec::new();
        let mut run: Option<String> = None;
        for segment in segments {
            match segment {
                Segment::Text(text) => run.get_or_insert_with(String::new).push_str(text),
                Segment::Placeholder => {
                    if let Some(text) = run.take() {
                        parts.push(Part::Text(text));
                    }
                    parts.push(Part::Placeholder);
                }
            }
        }
        if let Some(text) = run {
            parts.push(Part::Text(text));
        }

        Self::from_parts_unchecked(parts, values.into_iter().cloned().collect())
    }

    fn rendered(&self) -> &Rendered {
        self.0.rendered.get_or_init(|| self.render())
    }

    fn render(&self) -> Rendered {
        #[inline]
        fn decimal_digits(n: usize) -> usize {
            if n < 10 {
                1
            } else if n < 100 {
                2
            } else if n < 1000 {
                3
            } else {
                (n.ilog10() as usize) + 1
            }
        }

        let mut segments = Vec::new();
        let mut values = Vec::new();
        self.flatten_into(&mut segments, &mut values);

        // Pre-size to avoid repeated reallocations.
        let mut idx: usize = 0;
        let mut cap: usize = 0;
        for segment in &segments {
            match segment {
                Segment::Text(s) => cap += s.len(),
                Segment::Placeholder => {
                    idx += 1;
                    cap += 1 /* '$' */ + decimal_digits(idx);
                }
            }
        }

        let mut sql = String::with_capacity(cap);
        idx = 0;
        for segment in &segments {
            match segment {
                Segment::Text(s) => sql.push_str(s),
                Segment::Placeholder => {
                    idx += 1;
                    // Writing into a String cannot fail.
                    let _ = write!(sql, "${idx}");
                }
            }
        }

        let has_deferred = values.iter().any(|v| v.is_deferred());

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "sqlfrag.render",
            params = values.len(),
            deferred = has_deferred,
            "rendered fragment"
        );

        Rendered {
            sql,
            values: values.into_iter().cloned().collect(),
            has_deferred,
        }
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    ///
    /// Computed on first use and memoized for the lifetime of the node.
    pub fn query(&self) -> &str {
        &self.rendered().sql
    }

    /// All values of the flattened tree, in placeholder order, unresolved.
    pub fn flat_values(&self) -> &[Value] {
        &self.rendered().values
    }

    /// Whether any value in the flattened tree is [`Value::Deferred`].
    pub fn has_deferred(&self) -> bool {
        self.rendered().has_deferred
    }

    /// Number of `$n` placeholders in [`Fragment::query`].
    pub fn param_count(&self) -> usize {
        self.rendered().values.len()
    }

    /// Bound parameters with no call-time arguments.
    ///
    /// A deferred value that needs arguments fails here; use
    /// [`Fragment::values_with`] for those.
    pub fn values(&self) -> FragResult<Vec<Param>> {
        self.values_with(&CallArgs::new())
    }

    /// Bound parameters, invoking every deferred value with the same `args`.
    ///
    /// All-or-nothing: the first failing deferred value aborts the call.
    pub fn values_with(&self, args: &CallArgs) -> FragResult<Vec<Param>> {
        let rendered = self.rendered();
        if !rendered.has_deferred {
            return Ok(rendered
                .values
                .iter()
                .filter_map(Value::as_immediate)
                .cloned()
                .collect());
        }
        rendered.values.iter().map(|v| v.resolve(args)).collect()
    }

    /// Produce the executable `(sql, params)` pair.
    pub fn to_query(&self) -> FragResult<Query> {
        self.to_query_with(&CallArgs::new())
    }

    pub fn to_query_with(&self, args: &CallArgs) -> FragResult<Query> {
        let params = self.values_with(args)?;
        Ok(Query::new(self.query(), params))
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("sql", &self.query())
            .field("params", &self.param_count())
            .finish()
    }
}
