//! Evaluator-driven queries: projection, ordering, pagination and counting.
//!
//! Matching is delegated to an [`ExpressionEvaluator`], which turns a stored
//! State into zero or more projection rows. The query engine only orders,
//! deduplicates, counts and slices those rows.

use std::cmp::Ordering;

use docstore_state::keys::KEY_ID;
use docstore_state::{State, StateValue};
use tracing::trace;

use crate::table::{matches_value, StateTable};

/// One result row: the selected keys of a matching document.
pub type Projection = State;

/// Decides whether a document matches and what it projects to.
pub trait ExpressionEvaluator: Send + Sync {
    /// Rows projected from `state`; empty when it does not match. Wildcard
    /// selections over list elements yield several rows.
    fn matches(&self, state: &State) -> Vec<Projection>;
}

/// Evaluator backed by a closure.
pub struct FnEvaluator<F>(pub F);

impl<F> ExpressionEvaluator for FnEvaluator<F>
where
    F: Fn(&State) -> Vec<Projection> + Send + Sync,
{
    fn matches(&self, state: &State) -> Vec<Projection> {
        (self.0)(state)
    }
}

/// Matches documents whose `key` equals `value` (or whose array at `key`
/// contains it) and projects them to their id and the selected keys. A
/// `Null` value selects documents where `key` is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueEvaluator {
    key: String,
    value: StateValue,
    select: Vec<String>,
}

impl KeyValueEvaluator {
    pub fn new(key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            select: Vec::new(),
        }
    }

    pub fn select<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl ExpressionEvaluator for KeyValueEvaluator {
    fn matches(&self, state: &State) -> Vec<Projection> {
        if !matches_value(state, &self.key, &self.value) {
            return Vec::new();
        }
        let keys = std::iter::once(KEY_ID).chain(self.select.iter().map(String::as_str));
        vec![state.project(keys)]
    }
}

// ── Ordering ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByExpr {
    pub key: String,
    pub descending: bool,
}

impl OrderByExpr {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descending: false,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderByClause {
    pub exprs: Vec<OrderByExpr>,
}

impl OrderByClause {
    pub fn new(exprs: Vec<OrderByExpr>) -> Self {
        Self { exprs }
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Compares two rows key by key; missing values sort first.
    pub fn compare(&self, a: &Projection, b: &Projection) -> Ordering {
        for expr in &self.exprs {
            let left = a.get(&expr.key).unwrap_or(&StateValue::Null);
            let right = b.get(&expr.key).unwrap_or(&StateValue::Null);
            let ord = left.order_cmp(right);
            let ord = if expr.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

// ── Counting ──────────────────────────────────────────────────────────────

/// How much effort to spend computing the total size of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountUpTo {
    /// Count every match.
    Exact,
    /// Do not count; the total size is reported as `-1`.
    Skip,
    /// Count when there are at most this many matches, otherwise report
    /// `-2`.
    UpTo(usize),
}

impl CountUpTo {
    /// Decodes the integer convention: `-1` exact, `0` skip, `k > 0` up to
    /// `k`. Other negative values count exactly.
    pub fn from_sentinel(count_up_to: i64) -> Self {
        match count_up_to {
            0 => CountUpTo::Skip,
            k if k > 0 => CountUpTo::UpTo(usize::try_from(k).unwrap_or(usize::MAX)),
            _ => CountUpTo::Exact,
        }
    }

    pub fn total_size(self, matched: usize) -> i64 {
        let exact = i64::try_from(matched).unwrap_or(i64::MAX);
        match self {
            CountUpTo::Exact => exact,
            CountUpTo::Skip => -1,
            CountUpTo::UpTo(k) if matched > k => -2,
            CountUpTo::UpTo(_) => exact,
        }
    }
}

/// A page of rows and the total size under the requested [`CountUpTo`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartialList<T> {
    pub rows: Vec<T>,
    pub total_size: i64,
}

impl<T> PartialList<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Query ─────────────────────────────────────────────────────────────────

/// Page parameters of [`query_and_fetch`]. `limit == 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
    pub count_up_to: CountUpTo,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 0,
            offset: 0,
            count_up_to: CountUpTo::Exact,
        }
    }
}

impl Page {
    pub fn new(limit: usize, offset: usize, count_up_to: CountUpTo) -> Self {
        Self {
            limit,
            offset,
            count_up_to,
        }
    }
}

/// Runs `evaluator` over every stored document, then orders, deduplicates
/// (`distinct_documents` keeps the first row per document), counts and
/// slices the rows.
pub fn query_and_fetch(
    table: &StateTable,
    evaluator: &dyn ExpressionEvaluator,
    order_by: Option<&OrderByClause>,
    distinct_documents: bool,
    page: Page,
) -> PartialList<Projection> {
    let mut rows = Vec::new();
    table.for_each(|state| {
        let mut matched = evaluator.matches(state);
        if distinct_documents {
            matched.truncate(1);
        }
        rows.append(&mut matched);
    });
    if let Some(order_by) = order_by.filter(|o| !o.is_empty()) {
        rows.sort_by(|a, b| order_by.compare(a, b));
    }

    let total_size = page.count_up_to.total_size(rows.len());
    let start = page.offset.min(rows.len());
    let end = if page.limit == 0 {
        rows.len()
    } else {
        start.saturating_add(page.limit).min(rows.len())
    };
    trace!(matched = rows.len(), start, end, total_size, "query and fetch");
    let rows = rows.drain(start..end).collect();
    PartialList { rows, total_size }
}
