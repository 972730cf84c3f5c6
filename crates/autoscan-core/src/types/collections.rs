//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;

/// SmallVec for per-class rule lists (rarely more than two rules fire).
pub type SmallVec2<T> = SmallVec<[T; 2]>;
