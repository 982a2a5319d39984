use core::fmt::{self, Display, Formatter};

#[derive(Debug, Hash, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveType {
    UnsignedInteger(u16),
    SignedInteger(u16),
}

impl PrimitiveType {
    pub fn width(&self) -> u16 {
        match self {
            Self::SignedInteger(w) | Self::UnsignedInteger(w) => *w,
        }
    }
}

#[derive(Debug, Hash, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),

    /// Address of a stack slot or global
    Pointer,
}

macro_rules! type_def_helper {
    ($name: ident, $cls: ident, $width: expr) => {
        pub fn $name() -> Self {
            Self::new_primitive(PrimitiveType::$cls($width))
        }
    };
}

impl Type {
    pub fn new_primitive(primitive: PrimitiveType) -> Self {
        Self::Primitive(primitive)
    }

    pub fn width_bits(&self) -> u16 {
        match self {
            Self::Primitive(p) => p.width(),
            Self::Pointer => 64,
        }
    }

    type_def_helper!(u1, UnsignedInteger, 1);
    type_def_helper!(u8, UnsignedInteger, 8);
    type_def_helper!(u32, UnsignedInteger, 32);
    type_def_helper!(u64, UnsignedInteger, 64);
    type_def_helper!(s32, SignedInteger, 32);
    type_def_helper!(s64, SignedInteger, 64);
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(PrimitiveType::UnsignedInteger(w)) => write!(f, "u{w}"),
            Type::Primitive(PrimitiveType::SignedInteger(w)) => write!(f, "i{w}"),
            Type::Pointer => write!(f, "ptr"),
        }
    }
}

pub fn maybe_type_to_string(typ: Option<&Type>) -> String {
    match typ {
        Some(typ) => typ.to_string(),
        None => "void".to_owned(),
    }
}
