use std::{cmp::Ordering, fmt};

use rust_decimal::Decimal;

use super::RowId;

/// Ticks (100ns units) between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i128 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i128 = 10_000_000;
const NANOS_PER_SECOND: u32 = 1_000_000_000;
const NANOS_PER_TICK: u32 = 100;

/// Stable key of one object (row) within its table.
///
/// Keys are handed out monotonically by the owning table and never reused, so
/// a key doubles as the [`RowId`] tracked by row sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjKey(RowId);

impl ObjKey {
    /// Wraps a raw row identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: RowId) -> Self {
        Self(raw)
    }

    /// Returns the raw row identifier.
    #[inline]
    #[must_use]
    pub const fn get(self) -> RowId {
        self.0
    }
}

impl From<RowId> for ObjKey {
    fn from(value: RowId) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObjKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

/// Point in time with nanosecond precision, counted from the Unix epoch.
///
/// `nanoseconds` is always in `0..1_000_000_000`, so the derived ordering on
/// `(seconds, nanoseconds)` is chronological for instants before the epoch too.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {
    /// Builds a timestamp, carrying whole seconds out of `nanoseconds`.
    #[must_use]
    pub const fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds: seconds.saturating_add((nanoseconds / NANOS_PER_SECOND) as i64),
            nanoseconds: nanoseconds % NANOS_PER_SECOND,
        }
    }

    /// Converts host ticks (100ns units since 0001-01-01 UTC).
    #[must_use]
    pub fn from_ticks(ticks: i64) -> Self {
        let since_epoch = i128::from(ticks) - UNIX_EPOCH_TICKS;
        let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
        let remainder = since_epoch.rem_euclid(TICKS_PER_SECOND);
        Self {
            // |ticks| / 10^7 always fits in an i64.
            seconds: seconds as i64,
            nanoseconds: remainder as u32 * NANOS_PER_TICK,
        }
    }

    /// Converts back to host ticks, saturating outside the representable range.
    #[must_use]
    pub fn to_ticks(self) -> i64 {
        let ticks = i128::from(self.seconds) * TICKS_PER_SECOND
            + i128::from(self.nanoseconds / NANOS_PER_TICK)
            + UNIX_EPOCH_TICKS;
        i64::try_from(ticks).unwrap_or(if ticks < 0 { i64::MIN } else { i64::MAX })
    }

    /// Whole seconds since the Unix epoch.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.seconds
    }

    /// Sub-second part in nanoseconds.
    #[must_use]
    pub const fn nanoseconds(self) -> u32 {
        self.nanoseconds
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}:{}", self.seconds, self.nanoseconds)
    }
}

/// Twelve byte object identifier, ordered bytewise.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Wraps raw identifier bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Parses the 24 character hex form.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 24 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 12];
        for (slot, chunk) in bytes.iter_mut().zip(hex.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(chunk).ok()?;
            *slot = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// Returns the raw identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

/// Kind tag of a [`ScalarValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Absent value.
    Null,
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Point in time.
    Timestamp,
    /// High-precision decimal.
    Decimal,
    /// Twelve byte object identifier.
    ObjectId,
    /// UTF-8 text.
    String,
    /// Opaque bytes.
    Binary,
    /// Reference to another object.
    Link,
}

impl ScalarKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::Null => "null",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Decimal => "decimal",
            ScalarKind::ObjectId => "objectId",
            ScalarKind::String => "string",
            ScalarKind::Binary => "binary",
            ScalarKind::Link => "link",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal and stored cell values.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    /// Absent value; distinct from every zero or empty value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Point in time.
    Timestamp(Timestamp),
    /// High-precision decimal.
    Decimal(Decimal),
    /// Twelve byte object identifier.
    ObjectId(ObjectId),
    /// UTF-8 text.
    String(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
    /// Reference to another object.
    Link(ObjKey),
}

impl ScalarValue {
    /// Returns true when the value is the `Null` variant.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Returns the kind tag of this value.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Null => ScalarKind::Null,
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::Int(_) => ScalarKind::Int,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Double(_) => ScalarKind::Double,
            ScalarValue::Timestamp(_) => ScalarKind::Timestamp,
            ScalarValue::Decimal(_) => ScalarKind::Decimal,
            ScalarValue::ObjectId(_) => ScalarKind::ObjectId,
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Binary(_) => ScalarKind::Binary,
            ScalarValue::Link(_) => ScalarKind::Link,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the referenced object key, if any.
    #[must_use]
    pub fn as_link(&self) -> Option<ObjKey> {
        match self {
            ScalarValue::Link(key) => Some(*key),
            _ => None,
        }
    }

    /// Compares this value with another, returning the ordering when both sides
    /// are comparable.
    ///
    /// `Null` is never comparable. Int, float and double share one axis;
    /// decimals compare against decimals and integers.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Null, _) | (_, ScalarValue::Null) => None,
            (ScalarValue::Bool(lhs), ScalarValue::Bool(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::Int(lhs), ScalarValue::Int(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::Decimal(lhs), ScalarValue::Decimal(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::Decimal(lhs), ScalarValue::Int(rhs)) => {
                Some(lhs.cmp(&Decimal::from(*rhs)))
            }
            (ScalarValue::Int(lhs), ScalarValue::Decimal(rhs)) => {
                Some(Decimal::from(*lhs).cmp(rhs))
            }
            (ScalarValue::Timestamp(lhs), ScalarValue::Timestamp(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::ObjectId(lhs), ScalarValue::ObjectId(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::String(lhs), ScalarValue::String(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::Binary(lhs), ScalarValue::Binary(rhs)) => Some(lhs.cmp(rhs)),
            (ScalarValue::Link(lhs), ScalarValue::Link(rhs)) => Some(lhs.cmp(rhs)),
            (lhs, rhs) => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(value) => Some(*value as f64),
            ScalarValue::Float(value) => Some(f64::from(*value)),
            ScalarValue::Double(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Bool(value) => write!(f, "{value}"),
            ScalarValue::Int(value) => write!(f, "{value}"),
            ScalarValue::Float(value) => write!(f, "{value}"),
            ScalarValue::Double(value) => write!(f, "{value}"),
            ScalarValue::Timestamp(value) => write!(f, "{value}"),
            ScalarValue::Decimal(value) => write!(f, "{value}"),
            ScalarValue::ObjectId(value) => write!(f, "oid({value})"),
            ScalarValue::String(value) => write!(f, "{value:?}"),
            ScalarValue::Binary(value) => write!(f, "binary({} bytes)", value.len()),
            ScalarValue::Link(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<f32> for ScalarValue {
    fn from(value: f32) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Double(value)
    }
}

impl From<Timestamp> for ScalarValue {
    fn from(value: Timestamp) -> Self {
        ScalarValue::Timestamp(value)
    }
}

impl From<Decimal> for ScalarValue {
    fn from(value: Decimal) -> Self {
        ScalarValue::Decimal(value)
    }
}

impl From<ObjectId> for ScalarValue {
    fn from(value: ObjectId) -> Self {
        ScalarValue::ObjectId(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_owned())
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(value: Vec<u8>) -> Self {
        ScalarValue::Binary(value)
    }
}

impl From<&[u8]> for ScalarValue {
    fn from(value: &[u8]) -> Self {
        ScalarValue::Binary(value.to_vec())
    }
}

impl From<ObjKey> for ScalarValue {
    fn from(value: ObjKey) -> Self {
        ScalarValue::Link(value)
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ticks_round_trip_around_epoch() {
        let epoch = Timestamp::from_ticks(621_355_968_000_000_000);
        assert_eq!(epoch, Timestamp::new(0, 0));

        let before = Timestamp::from_ticks(621_355_968_000_000_000 - 1);
        assert_eq!(before.seconds(), -1);
        assert_eq!(before.nanoseconds(), 999_999_900);
        assert!(before < epoch);
        assert_eq!(before.to_ticks(), 621_355_968_000_000_000 - 1);
    }

    #[test]
    fn timestamp_new_carries_nanoseconds() {
        let ts = Timestamp::new(1, 2_500_000_000);
        assert_eq!(ts.seconds(), 3);
        assert_eq!(ts.nanoseconds(), 500_000_000);
    }

    #[test]
    fn object_id_hex_parsing() {
        let oid = ObjectId::from_hex("5f63e882536de46d71877979").expect("valid hex");
        assert_eq!(oid.to_string(), "5f63e882536de46d71877979");
        assert!(ObjectId::from_hex("5f63").is_none());
        assert!(ObjectId::from_hex("zz63e882536de46d71877979").is_none());
    }

    #[test]
    fn numeric_kinds_share_an_axis() {
        let int = ScalarValue::from(3i64);
        let double = ScalarValue::from(2.5f64);
        let float = ScalarValue::from(3.0f32);
        assert_eq!(int.compare(&double), Some(Ordering::Greater));
        assert_eq!(int.compare(&float), Some(Ordering::Equal));

        let decimal = ScalarValue::from(Decimal::new(305, 2));
        assert_eq!(decimal.compare(&int), Some(Ordering::Greater));
        assert_eq!(decimal.compare(&double), None);
    }

    #[test]
    fn null_is_never_comparable() {
        assert_eq!(ScalarValue::Null.compare(&ScalarValue::Null), None);
        assert_eq!(ScalarValue::from(false).compare(&ScalarValue::Null), None);
        assert_ne!(ScalarValue::from(0i64), ScalarValue::Null);
    }

    #[test]
    fn mismatched_kinds_do_not_compare() {
        let text = ScalarValue::from("1");
        let int = ScalarValue::from(1i64);
        assert_eq!(text.compare(&int), None);
        assert_eq!(ScalarValue::from(true).compare(&int), None);
    }
}
