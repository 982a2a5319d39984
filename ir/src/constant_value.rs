use core::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ConstantValue {
    UnsignedInteger(u64),
    SignedInteger(i64),
}

impl ConstantValue {
    pub fn zero(&self) -> bool {
        match self {
            ConstantValue::UnsignedInteger(v) => *v == 0,
            ConstantValue::SignedInteger(v) => *v == 0,
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, ConstantValue::UnsignedInteger(_))
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, ConstantValue::SignedInteger(_))
    }

    /// Bit pattern of the constant reinterpreted as a signed 64-bit integer
    pub fn as_i64(&self) -> i64 {
        match self {
            ConstantValue::UnsignedInteger(v) => *v as i64,
            ConstantValue::SignedInteger(v) => *v,
        }
    }
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::UnsignedInteger(v) => write!(f, "{v}u"),
            ConstantValue::SignedInteger(v) => write!(f, "{v}s"),
        }
    }
}
