//! Typed operand passed across the query boundary.

use std::fmt;

use ember_predicate::{Decimal, ObjectId, ScalarKind, ScalarValue, Timestamp};

/// Tagged primitive handed to [`Query::compare`](crate::Query::compare) and
/// [`Object::set`](crate::Object::set).
///
/// `Null` is a state of its own: it never equals a present zero or `false`,
/// and queries only accept it through the null-aware operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrimitiveValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Point in time.
    Timestamp(Timestamp),
    /// 128-bit decimal.
    Decimal(Decimal),
    /// 12-byte object id.
    ObjectId(ObjectId),
}

impl PrimitiveValue {
    /// Timestamp given in 100ns ticks since 0001-01-01, the host's native unit.
    #[must_use]
    pub fn from_ticks(ticks: i64) -> Self {
        PrimitiveValue::Timestamp(Timestamp::from_ticks(ticks))
    }

    /// Returns false for [`PrimitiveValue::Null`].
    #[must_use]
    pub fn has_value(&self) -> bool {
        !matches!(self, PrimitiveValue::Null)
    }

    /// Kind of the literal, `Null` included.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            PrimitiveValue::Null => ScalarKind::Null,
            PrimitiveValue::Bool(_) => ScalarKind::Bool,
            PrimitiveValue::Int(_) => ScalarKind::Int,
            PrimitiveValue::Float(_) => ScalarKind::Float,
            PrimitiveValue::Double(_) => ScalarKind::Double,
            PrimitiveValue::Timestamp(_) => ScalarKind::Timestamp,
            PrimitiveValue::Decimal(_) => ScalarKind::Decimal,
            PrimitiveValue::ObjectId(_) => ScalarKind::ObjectId,
        }
    }
}

impl From<PrimitiveValue> for ScalarValue {
    fn from(value: PrimitiveValue) -> Self {
        match value {
            PrimitiveValue::Null => ScalarValue::Null,
            PrimitiveValue::Bool(v) => ScalarValue::Bool(v),
            PrimitiveValue::Int(v) => ScalarValue::Int(v),
            PrimitiveValue::Float(v) => ScalarValue::Float(v),
            PrimitiveValue::Double(v) => ScalarValue::Double(v),
            PrimitiveValue::Timestamp(v) => ScalarValue::Timestamp(v),
            PrimitiveValue::Decimal(v) => ScalarValue::Decimal(v),
            PrimitiveValue::ObjectId(v) => ScalarValue::ObjectId(v),
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&ScalarValue::from(*self), f)
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PrimitiveValue {
                fn from(value: $ty) -> Self {
                    PrimitiveValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i64 => Int,
    f32 => Float,
    f64 => Double,
    Timestamp => Timestamp,
    Decimal => Decimal,
    ObjectId => ObjectId,
}

impl From<i32> for PrimitiveValue {
    fn from(value: i32) -> Self {
        PrimitiveValue::Int(i64::from(value))
    }
}

impl<T> From<Option<T>> for PrimitiveValue
where
    T: Into<PrimitiveValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(PrimitiveValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_distinct_from_zero_and_false() {
        assert!(!PrimitiveValue::Null.has_value());
        assert_ne!(PrimitiveValue::Null, PrimitiveValue::Int(0));
        assert_ne!(PrimitiveValue::Null, PrimitiveValue::Bool(false));
        assert_eq!(PrimitiveValue::from(None::<i64>), PrimitiveValue::Null);
    }

    #[test]
    fn every_kind_reaches_the_matching_scalar() {
        let values = [
            PrimitiveValue::Null,
            PrimitiveValue::Bool(true),
            PrimitiveValue::Int(-4),
            PrimitiveValue::Float(1.5),
            PrimitiveValue::Double(2.5),
            PrimitiveValue::from_ticks(621_355_968_000_000_000),
            PrimitiveValue::Decimal(Decimal::new(1234, 2)),
            PrimitiveValue::ObjectId(ObjectId::from_bytes([7; 12])),
        ];
        for value in values {
            assert_eq!(ScalarValue::from(value).kind(), value.kind());
        }
    }

    #[test]
    fn ticks_use_the_host_epoch() {
        let PrimitiveValue::Timestamp(ts) = PrimitiveValue::from_ticks(621_355_968_010_000_000)
        else {
            panic!("expected timestamp");
        };
        assert_eq!(ts.seconds(), 1);
        assert_eq!(ts.nanoseconds(), 0);
    }
}
