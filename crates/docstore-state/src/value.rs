//! Value model for document state.
//!
//! A [`StateValue`] is a closed tagged union: every shape a document field can
//! take is a variant, so the diff applier matches exhaustively instead of
//! probing types at runtime.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::delta::Delta;
use crate::error::StateError;
use crate::state::State;

// ── Scalar ────────────────────────────────────────────────────────────────

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Long(_) => "long",
            Scalar::Double(_) => "double",
            Scalar::Boolean(_) => "boolean",
            Scalar::Date(_) => "date",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Long(_) | Scalar::Double(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Long(n) => Some(*n as f64),
            Scalar::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Rank used to order scalars of different types against each other.
    fn rank(&self) -> u8 {
        match self {
            Scalar::Boolean(_) => 0,
            Scalar::Long(_) | Scalar::Double(_) => 1,
            Scalar::String(_) => 2,
            Scalar::Date(_) => 3,
        }
    }

    /// Total ordering used by query sorting.
    ///
    /// Numbers compare by value regardless of integer/floating kind; values
    /// of different types compare by a fixed type rank.
    pub fn order_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
            (Scalar::Long(a), Scalar::Long(b)) => a.cmp(b),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
            (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

// ── StateValue ────────────────────────────────────────────────────────────

/// A field value inside a [`State`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StateValue {
    #[default]
    Null,
    Scalar(Scalar),
    State(State),
    /// Fixed-size array, typically of scalars (e.g. `ecm:ancestorIds`).
    Array(Vec<StateValue>),
    /// Growable list, typically of nested States (complex properties).
    List(Vec<StateValue>),
    /// Pending increment built by a transient session. Never stored in a
    /// repository: [`StateValue::deep_copy`] resolves it to its full value.
    Delta(Delta),
}

impl StateValue {
    pub fn string(s: impl Into<String>) -> Self {
        StateValue::Scalar(Scalar::String(s.into()))
    }

    pub fn long(n: i64) -> Self {
        StateValue::Scalar(Scalar::Long(n))
    }

    pub fn double(n: f64) -> Self {
        StateValue::Scalar(Scalar::Double(n))
    }

    pub fn boolean(b: bool) -> Self {
        StateValue::Scalar(Scalar::Boolean(b))
    }

    pub fn date(d: DateTime<Utc>) -> Self {
        StateValue::Scalar(Scalar::Date(d))
    }

    /// Builds an array of strings, the shape used for id arrays.
    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StateValue::Array(items.into_iter().map(StateValue::string).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StateValue::Null => "null",
            StateValue::Scalar(s) => s.type_name(),
            StateValue::State(_) => "state",
            StateValue::Array(_) => "array",
            StateValue::List(_) => "list",
            StateValue::Delta(_) => "delta",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            StateValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            StateValue::Scalar(Scalar::Long(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            StateValue::Scalar(Scalar::Double(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Scalar(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            StateValue::Scalar(Scalar::Date(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&State> {
        match self {
            StateValue::State(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_state_mut(&mut self) -> Option<&mut State> {
        match self {
            StateValue::State(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of an array or a list.
    pub fn as_items(&self) -> Option<&[StateValue]> {
        match self {
            StateValue::Array(items) | StateValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` if this is an array or list holding an element equal
    /// to `needle`.
    pub fn contains_item(&self, needle: &StateValue) -> bool {
        self.as_items()
            .map(|items| items.iter().any(|item| item == needle))
            .unwrap_or(false)
    }

    /// Independent copy of this value with every pending [`Delta`] replaced
    /// by its full value. Fails when a Long delta overflows.
    pub fn deep_copy(&self) -> Result<StateValue, StateError> {
        let copy = match self {
            StateValue::Null => StateValue::Null,
            StateValue::Scalar(s) => StateValue::Scalar(s.clone()),
            StateValue::State(s) => StateValue::State(s.deep_copy()?),
            StateValue::Array(items) => StateValue::Array(deep_copy_items(items)?),
            StateValue::List(items) => StateValue::List(deep_copy_items(items)?),
            StateValue::Delta(d) => StateValue::Scalar(d.full_value()?),
        };
        Ok(copy)
    }

    /// Ordering used when sorting query results: nulls first, then scalars
    /// by [`Scalar::order_cmp`]. Containers only compare by shape.
    pub fn order_cmp(&self, other: &StateValue) -> Ordering {
        match (self, other) {
            (StateValue::Null, StateValue::Null) => Ordering::Equal,
            (StateValue::Null, _) => Ordering::Less,
            (_, StateValue::Null) => Ordering::Greater,
            (StateValue::Scalar(a), StateValue::Scalar(b)) => a.order_cmp(b),
            (StateValue::Delta(a), b) => StateValue::Scalar(resolved(a)).order_cmp(b),
            (a, StateValue::Delta(b)) => a.order_cmp(&StateValue::Scalar(resolved(b))),
            (a, b) => a.shape_rank().cmp(&b.shape_rank()),
        }
    }

    fn shape_rank(&self) -> u8 {
        match self {
            StateValue::Null => 0,
            StateValue::Scalar(_) | StateValue::Delta(_) => 1,
            StateValue::Array(_) => 2,
            StateValue::List(_) => 3,
            StateValue::State(_) => 4,
        }
    }
}

fn deep_copy_items(items: &[StateValue]) -> Result<Vec<StateValue>, StateError> {
    items.iter().map(StateValue::deep_copy).collect()
}

/// Full value of a delta for comparison, falling back to a float when a
/// Long sum overflows.
fn resolved(delta: &Delta) -> Scalar {
    delta.full_value().unwrap_or_else(|_| Scalar::Double(delta.as_f64()))
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<Scalar> for StateValue {
    fn from(s: Scalar) -> Self {
        StateValue::Scalar(s)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::string(s)
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::string(s)
    }
}

impl From<i64> for StateValue {
    fn from(n: i64) -> Self {
        StateValue::long(n)
    }
}

impl From<i32> for StateValue {
    fn from(n: i32) -> Self {
        StateValue::long(n as i64)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        StateValue::double(n)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::boolean(b)
    }
}

impl From<DateTime<Utc>> for StateValue {
    fn from(d: DateTime<Utc>) -> Self {
        StateValue::date(d)
    }
}

impl From<State> for StateValue {
    fn from(s: State) -> Self {
        StateValue::State(s)
    }
}

impl From<Delta> for StateValue {
    fn from(d: Delta) -> Self {
        StateValue::Delta(d)
    }
}

impl<T: Into<StateValue>> From<Option<T>> for StateValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(StateValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_nulls_first() {
        assert_eq!(StateValue::Null.order_cmp(&StateValue::long(1)), Ordering::Less);
        assert_eq!(StateValue::string("a").order_cmp(&StateValue::Null), Ordering::Greater);
        assert_eq!(StateValue::Null.order_cmp(&StateValue::Null), Ordering::Equal);
    }

    #[test]
    fn test_order_mixed_numbers() {
        assert_eq!(StateValue::long(2).order_cmp(&StateValue::double(2.5)), Ordering::Less);
        assert_eq!(StateValue::double(3.0).order_cmp(&StateValue::long(3)), Ordering::Equal);
    }

    #[test]
    fn test_order_strings() {
        assert_eq!(StateValue::string("abc").order_cmp(&StateValue::string("abd")), Ordering::Less);
    }

    #[test]
    fn test_deep_copy_resolves_delta() {
        let v = StateValue::List(vec![StateValue::Delta(Delta::long(10, 5))]);
        assert_eq!(v.deep_copy(), Ok(StateValue::List(vec![StateValue::long(15)])));
    }

    #[test]
    fn test_deep_copy_overflowing_delta_fails() {
        let v = StateValue::Array(vec![StateValue::Delta(Delta::long(i64::MAX, 1))]);
        assert!(matches!(v.deep_copy(), Err(StateError::NumericOverflow(_))));
    }

    #[test]
    fn test_order_overflowing_delta() {
        let big = StateValue::Delta(Delta::long(i64::MAX, 1));
        assert_eq!(big.order_cmp(&StateValue::long(1)), Ordering::Greater);
    }

    #[test]
    fn test_contains_item() {
        let ids = StateValue::string_array(["a", "b"]);
        assert!(ids.contains_item(&"b".into()));
        assert!(!ids.contains_item(&"c".into()));
        assert!(!StateValue::long(1).contains_item(&StateValue::long(1)));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(StateValue::from(None::<String>), StateValue::Null);
        assert_eq!(StateValue::from(Some("x")), StateValue::string("x"));
    }
}
