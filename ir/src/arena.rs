use core::{
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Append-only storage of `T`s addressed by [`Ref`]s
///
/// Removing an entry leaves a tombstone behind, indices are never reused so a
/// stale `Ref` can always be told apart from a live one.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    vec: Vec<Option<T>>,
}

impl<T: serde::Serialize> serde::Serialize for Arena<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.vec.serialize(serializer)
    }
}

impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Arena<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <Vec<Option<T>> as serde::Deserialize>::deserialize(deserializer).map(|vec| Arena { vec })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { vec: Vec::new() }
    }

    pub fn insert(&mut self, t: T) -> Ref<T> {
        self.vec.push(Some(t));
        Ref {
            index: self.vec.len() - 1,
            _phantom: PhantomData,
        }
    }

    /// Takes the entry out of the arena, leaving a tombstone
    pub fn remove(&mut self, r: Ref<T>) -> Option<T> {
        self.vec.get_mut(r.index).and_then(Option::take)
    }

    pub fn contains(&self, r: Ref<T>) -> bool {
        matches!(self.vec.get(r.index), Some(Some(_)))
    }

    pub fn get(&self, r: Ref<T>) -> Option<&T> {
        self.vec.get(r.index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, r: Ref<T>) -> Option<&mut T> {
        self.vec.get_mut(r.index).and_then(Option::as_mut)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.vec.iter().filter(|t| t.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over live entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Ref<T>, &T)> {
        self.vec.iter().enumerate().filter_map(|(index, t)| {
            t.as_ref().map(|t| {
                (
                    Ref {
                        index,
                        _phantom: PhantomData,
                    },
                    t,
                )
            })
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct Ref<T> {
    index: usize,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> Ref<T> {
    /// Gets the entry behind this reference
    ///
    /// Panics if the entry was removed, dereferencing an erased entity is
    /// always a bug in the caller.
    pub fn get<'reph, 'arena: 'reph>(&self, arena: &'arena Arena<T>) -> &'reph T {
        arena
            .get(*self)
            .unwrap_or_else(|| panic!("use of erased entity {self:?}"))
    }

    pub fn get_mut<'reph, 'arena: 'reph>(&self, arena: &'arena mut Arena<T>) -> &'reph mut T {
        let this = *self;
        arena
            .get_mut(this)
            .unwrap_or_else(|| panic!("use of erased entity {this:?}"))
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Ref<T> {}

impl<T> PartialOrd for Ref<T> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ref<T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> Debug for Ref<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ref {:#x}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn removed_entries_leave_tombstones() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);

        assert_eq!(arena.remove(a), Some(1));
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);

        // indices are never reused
        let c = arena.insert(3);
        assert_ne!(a, c);
        assert_eq!(*b.get(&arena), 2);
    }

    #[test]
    fn double_remove_is_none() {
        let mut arena = Arena::new();
        let a = arena.insert("x");
        assert_eq!(arena.remove(a), Some("x"));
        assert_eq!(arena.remove(a), None);
    }

    #[test]
    #[should_panic(expected = "use of erased entity")]
    fn get_after_remove_panics() {
        let mut arena = Arena::new();
        let a = arena.insert(1u8);
        arena.remove(a);
        a.get(&arena);
    }
}
