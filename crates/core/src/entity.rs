//! Entity trait.

/// A record identified by a key rather than by its attributes.
///
/// Menus and groups are entities: two rows with the same identifier describe
/// the same thing, and stores key them by [`Entity::id`].
pub trait Entity {
    type Id: Clone + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
