use {
    core::hash::BuildHasherDefault,
    lasso::{Key, Spur},
    once_cell::sync::Lazy,
    twox_hash::XxHash64,
};

type Interner = lasso::ThreadedRodeo<Spur, BuildHasherDefault<XxHash64>>;

static INTERNER: Lazy<Interner> = Lazy::new(|| Interner::with_hasher(Default::default()));

/// Key for an interned string
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Hash, Ord)]
pub struct InternedString(Spur);

impl InternedString {
    /// Create a new interned string
    pub fn new<A: AsRef<str>>(str: A) -> Self {
        Self(INTERNER.get_or_intern(str.as_ref()))
    }

    /// Create a new interned string from a static str
    pub fn from_static(key: &'static str) -> Self {
        Self(INTERNER.get_or_intern_static(key))
    }

    /// Gets the inner key of the interned string
    pub fn key(&self) -> u32 {
        // spurs are backed by a u32
        self.0.into_usize() as u32
    }
}

impl AsRef<str> for InternedString {
    fn as_ref(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl From<Spur> for InternedString {
    fn from(spur: Spur) -> Self {
        Self(spur)
    }
}

impl From<String> for InternedString {
    fn from(string: String) -> Self {
        Self::new(string)
    }
}

impl From<&'_ str> for InternedString {
    fn from(string: &str) -> Self {
        Self::new(string)
    }
}

impl core::fmt::Debug for InternedString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_ref(), f)
    }
}

impl core::fmt::Display for InternedString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl<'de> serde::Deserialize<'de> for InternedString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl serde::Serialize for InternedString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_ref().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::InternedString;

    #[test]
    fn same_string_same_key() {
        let a = InternedString::new("alpha");
        let b = InternedString::from(String::from("alpha"));
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.as_ref(), "alpha");
    }

    #[test]
    fn display_resolves() {
        let s = InternedString::from_static("beta");
        assert_eq!(s.to_string(), "beta");
        assert_eq!(format!("{s:?}"), "\"beta\"");
    }
}
