//! Value object marker: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// Pagination positions are the main example in this workspace: two cursors
/// pointing at the same key in the same direction are the same cursor, no
/// matter which request produced them. To "change" a value object, build a
/// new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Bound {
///     key: String,
///     inclusive: bool,
/// }
///
/// impl ValueObject for Bound {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
