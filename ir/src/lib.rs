//! Arena-backed IR object model
//!
//! Functions, basic blocks, parameters and instructions all live in arenas
//! owned by a [`Module`](module::Module) and are addressed by stable
//! [`Ref`](arena::Ref) handles. Instructions reference their operands through
//! [`Value`](value::Value)s, never by owning them.

pub use hashbrown::hash_map::Entry;
use {core::hash::BuildHasherDefault, twox_hash::XxHash64};

pub mod arena;
pub mod block;
pub mod builder;
pub mod constant_value;
pub mod function;
pub mod instruction;
pub mod intern;
pub mod interpret;
pub mod module;
pub mod types;
pub mod value;

pub type Hasher = XxHash64;

/// HashMap with non-default hasher
pub type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<Hasher>>;

/// HashSet with non-default hasher
pub type HashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<Hasher>>;
