//! ID types for the solver arena
//!
//! Variables and values are interned per session so the hot paths work on
//! small integers instead of names:
//! - `VarId` indexes the variable arena shared by the alias map and the store
//! - `ValueId` indexes the Domain's value list and is the element type of
//!   candidate bitmaps

/// Session-local variable index (0..N-1), assigned in declaration order.
pub type VarId = usize;

/// Index of a value within the session's Domain.
/// `u32` so candidate sets can be stored as `RoaringBitmap`s.
pub type ValueId = u32;

/// Upper bound on alias-chain length before resolution is declared cyclic.
pub const MAX_ALIAS_DEPTH: usize = 1000;
