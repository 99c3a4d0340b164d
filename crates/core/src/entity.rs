//! Entity trait: identity + continuity across state changes.

use crate::id::OwnerId;

/// Entity marker + minimal interface.
///
/// Every stored entity carries a strongly-typed identifier and is owned by
/// exactly one account. Cross-owner visibility is never permitted.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the owning account.
    fn owner(&self) -> OwnerId;
}
