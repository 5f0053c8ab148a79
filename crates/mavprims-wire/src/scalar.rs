use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;

use crate::error::{Result, WireError};

/// Primitive wire types. All multi-byte kinds are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Char,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl FieldKind {
    /// Every kind, in type-code order.
    pub const ALL: [FieldKind; 11] = [
        FieldKind::Char,
        FieldKind::U8,
        FieldKind::I8,
        FieldKind::U16,
        FieldKind::I16,
        FieldKind::U32,
        FieldKind::I32,
        FieldKind::U64,
        FieldKind::I64,
        FieldKind::F32,
        FieldKind::F64,
    ];

    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Char | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Numeric type code used by schema tooling.
    pub const fn type_code(self) -> u8 {
        match self {
            Self::Char => 0,
            Self::U8 => 1,
            Self::I8 => 2,
            Self::U16 => 3,
            Self::I16 => 4,
            Self::U32 => 5,
            Self::I32 => 6,
            Self::U64 => 7,
            Self::I64 => 8,
            Self::F32 => 9,
            Self::F64 => 10,
        }
    }

    /// C type name as it appears in message definitions.
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::U8 => "uint8_t",
            Self::I8 => "int8_t",
            Self::U16 => "uint16_t",
            Self::I16 => "int16_t",
            Self::U32 => "uint32_t",
            Self::I32 => "int32_t",
            Self::U64 => "uint64_t",
            Self::I64 => "int64_t",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    /// The all-zero value of this kind.
    pub const fn zero(self) -> Scalar {
        match self {
            Self::Char => Scalar::Char(0),
            Self::U8 => Scalar::U8(0),
            Self::I8 => Scalar::I8(0),
            Self::U16 => Scalar::U16(0),
            Self::I16 => Scalar::I16(0),
            Self::U32 => Scalar::U32(0),
            Self::I32 => Scalar::I32(0),
            Self::U64 => Scalar::U64(0),
            Self::I64 => Scalar::I64(0),
            Self::F32 => Scalar::F32(0.0),
            Self::F64 => Scalar::F64(0.0),
        }
    }

    /// Look up a kind by its type code.
    pub fn from_type_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

impl FromStr for FieldKind {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "char" => Ok(Self::Char),
            // The heartbeat's protocol version byte is declared with its own type name.
            "uint8_t" | "uint8_t_mavlink_version" => Ok(Self::U8),
            "int8_t" => Ok(Self::I8),
            "uint16_t" => Ok(Self::U16),
            "int16_t" => Ok(Self::I16),
            "uint32_t" => Ok(Self::U32),
            "int32_t" => Ok(Self::I32),
            "uint64_t" => Ok(Self::U64),
            "int64_t" => Ok(Self::I64),
            "float" => Ok(Self::F32),
            "double" => Ok(Self::F64),
            other => Err(WireError::UnknownFieldKind(other.to_string())),
        }
    }
}

/// One typed position in a payload layout.
///
/// `array_len == 0` means a scalar; otherwise the slot holds exactly
/// `array_len` contiguous elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub kind: FieldKind,
    pub array_len: usize,
}

impl Slot {
    pub const fn scalar(kind: FieldKind) -> Self {
        Self { kind, array_len: 0 }
    }

    pub const fn array(kind: FieldKind, array_len: usize) -> Self {
        Self { kind, array_len }
    }

    pub const fn is_array(&self) -> bool {
        self.array_len > 0
    }

    /// Number of flat elements this slot occupies.
    pub const fn element_count(&self) -> usize {
        if self.array_len == 0 {
            1
        } else {
            self.array_len
        }
    }

    /// Bytes this slot occupies on the wire.
    pub const fn wire_size(&self) -> usize {
        self.element_count() * self.kind.size()
    }

    /// The all-zero value for this slot.
    pub fn zero_value(&self) -> Value {
        if self.is_array() {
            Value::Array(vec![self.kind.zero(); self.array_len])
        } else {
            Value::Scalar(self.kind.zero())
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array() {
            write!(f, "{}[{}]", self.kind, self.array_len)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// A single primitive value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Char(u8),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Char(_) => FieldKind::Char,
            Self::U8(_) => FieldKind::U8,
            Self::I8(_) => FieldKind::I8,
            Self::U16(_) => FieldKind::U16,
            Self::I16(_) => FieldKind::I16,
            Self::U32(_) => FieldKind::U32,
            Self::I32(_) => FieldKind::I32,
            Self::U64(_) => FieldKind::U64,
            Self::I64(_) => FieldKind::I64,
            Self::F32(_) => FieldKind::F32,
            Self::F64(_) => FieldKind::F64,
        }
    }

    /// Unsigned view; `None` for floats and negative integers.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Char(v) | Self::U8(v) => Some(u64::from(v)),
            Self::U16(v) => Some(u64::from(v)),
            Self::U32(v) => Some(u64::from(v)),
            Self::U64(v) => Some(v),
            Self::I8(v) => u64::try_from(v).ok(),
            Self::I16(v) => u64::try_from(v).ok(),
            Self::I32(v) => u64::try_from(v).ok(),
            Self::I64(v) => u64::try_from(v).ok(),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Signed view; `None` for floats and `u64` values above `i64::MAX`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Char(v) | Self::U8(v) => Some(i64::from(v)),
            Self::U16(v) => Some(i64::from(v)),
            Self::U32(v) => Some(i64::from(v)),
            Self::U64(v) => i64::try_from(v).ok(),
            Self::I8(v) => Some(i64::from(v)),
            Self::I16(v) => Some(i64::from(v)),
            Self::I32(v) => Some(i64::from(v)),
            Self::I64(v) => Some(v),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Floating point view; integers are converted, possibly losing precision.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::F32(v) => f64::from(v),
            Self::F64(v) => v,
            Self::U64(v) => v as f64,
            Self::I64(v) => v as f64,
            other => other.as_i64().map_or(0.0, |v| v as f64),
        }
    }

    /// Append the little-endian encoding to `dst`.
    pub fn put<B: BufMut>(&self, dst: &mut B) {
        match *self {
            Self::Char(v) | Self::U8(v) => dst.put_u8(v),
            Self::I8(v) => dst.put_i8(v),
            Self::U16(v) => dst.put_u16_le(v),
            Self::I16(v) => dst.put_i16_le(v),
            Self::U32(v) => dst.put_u32_le(v),
            Self::I32(v) => dst.put_i32_le(v),
            Self::U64(v) => dst.put_u64_le(v),
            Self::I64(v) => dst.put_i64_le(v),
            Self::F32(v) => dst.put_f32_le(v),
            Self::F64(v) => dst.put_f64_le(v),
        }
    }

    /// Read one value of `kind`. The caller guarantees `src` holds `kind.size()` bytes.
    fn get<B: Buf>(kind: FieldKind, src: &mut B) -> Self {
        match kind {
            FieldKind::Char => Self::Char(src.get_u8()),
            FieldKind::U8 => Self::U8(src.get_u8()),
            FieldKind::I8 => Self::I8(src.get_i8()),
            FieldKind::U16 => Self::U16(src.get_u16_le()),
            FieldKind::I16 => Self::I16(src.get_i16_le()),
            FieldKind::U32 => Self::U32(src.get_u32_le()),
            FieldKind::I32 => Self::I32(src.get_i32_le()),
            FieldKind::U64 => Self::U64(src.get_u64_le()),
            FieldKind::I64 => Self::I64(src.get_i64_le()),
            FieldKind::F32 => Self::F32(src.get_f32_le()),
            FieldKind::F64 => Self::F64(src.get_f64_le()),
        }
    }
}

/// A field value: one scalar or a fixed-length array of scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl Value {
    /// A `char[N]` array from raw bytes. No terminator is implied.
    pub fn chars(bytes: &[u8]) -> Self {
        Self::Array(bytes.iter().map(|&b| Scalar::Char(b)).collect())
    }

    /// Whether this value has the kind and length `slot` demands.
    pub fn matches(&self, slot: &Slot) -> bool {
        match self {
            Self::Scalar(s) => !slot.is_array() && s.kind() == slot.kind,
            Self::Array(items) => {
                slot.is_array()
                    && items.len() == slot.array_len
                    && items.iter().all(|s| s.kind() == slot.kind)
            }
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(items) => Some(items),
        }
    }

    /// Raw bytes of a `char`, `uint8_t` or `int8_t` array.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        self.as_array()?
            .iter()
            .map(|s| match *s {
                Scalar::Char(b) | Scalar::U8(b) => Some(b),
                Scalar::I8(b) => Some(b as u8),
                _ => None,
            })
            .collect()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_scalar()?.as_u64()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar()?.as_i64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().map(Scalar::as_f64)
    }

    /// Number of flat elements this value contributes.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Array(items) => items.len(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(value: Vec<Scalar>) -> Self {
        Self::Array(value)
    }
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(Scalar::$variant(value))
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::Array(values.into_iter().map(Scalar::$variant).collect())
                }
            }

            impl<const N: usize> From<[$ty; N]> for Value {
                fn from(values: [$ty; N]) -> Self {
                    Value::Array(values.into_iter().map(Scalar::$variant).collect())
                }
            }
        )*
    };
}

impl_primitive!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

/// Total wire size of a layout.
pub fn layout_size(slots: &[Slot]) -> usize {
    slots.iter().map(Slot::wire_size).sum()
}

/// Pack `values` according to `slots`, appending to `dst`.
pub fn encode_values<'a, I>(slots: &[Slot], values: I, dst: &mut BytesMut) -> Result<()>
where
    I: IntoIterator<Item = &'a Value>,
    I::IntoIter: ExactSizeIterator,
{
    let values = values.into_iter();
    if slots.len() != values.len() {
        return Err(WireError::FieldCount {
            expected: slots.len(),
            actual: values.len(),
        });
    }

    dst.reserve(layout_size(slots));
    for (index, (slot, value)) in slots.iter().zip(values).enumerate() {
        if !value.matches(slot) {
            return Err(WireError::ValueMismatch {
                index,
                expected: *slot,
            });
        }
        match value {
            Value::Scalar(scalar) => scalar.put(dst),
            Value::Array(items) => items.iter().for_each(|scalar| scalar.put(dst)),
        }
    }
    Ok(())
}

/// Unpack `src` into one flat element per scalar and per array position.
///
/// Bytes beyond the layout size are ignored.
pub fn decode_flat(slots: &[Slot], src: &[u8]) -> Result<Vec<Scalar>> {
    let needed = layout_size(slots);
    if src.len() < needed {
        return Err(WireError::TruncatedPayload {
            needed,
            available: src.len(),
        });
    }

    let mut cursor = &src[..needed];
    let mut flat = Vec::with_capacity(slots.iter().map(Slot::element_count).sum());
    for slot in slots {
        for _ in 0..slot.element_count() {
            flat.push(Scalar::get(slot.kind, &mut cursor));
        }
    }
    Ok(flat)
}

/// Group flat elements back into one value per slot.
///
/// An array slot of length N consumes N consecutive elements.
pub fn group_flat(slots: &[Slot], flat: Vec<Scalar>) -> Result<Vec<Value>> {
    let expected: usize = slots.iter().map(Slot::element_count).sum();
    if flat.len() != expected {
        return Err(WireError::FieldCount {
            expected,
            actual: flat.len(),
        });
    }

    let mut elements = flat.into_iter();
    let grouped = slots
        .iter()
        .map(|slot| {
            if slot.is_array() {
                Value::Array(elements.by_ref().take(slot.array_len).collect())
            } else {
                // Length was checked above.
                Value::Scalar(elements.next().unwrap_or(slot.kind.zero()))
            }
        })
        .collect();
    Ok(grouped)
}

/// Unpack `src` into one value per slot.
pub fn decode_values(slots: &[Slot], src: &[u8]) -> Result<Vec<Value>> {
    group_flat(slots, decode_flat(slots, src)?)
}
