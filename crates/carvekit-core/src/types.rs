//! Type aliases for commonly used complex types.

/// A boxed dynamically-typed iterator.
///
/// Used when the concrete iterator type varies at runtime, e.g. forward
/// versus reverse column traversal: `Range<T>` and `Rev<Range<T>>` are
/// different types and cannot share a variable without boxing.
pub type BoxedIterator<T> = Box<dyn Iterator<Item = T>>;
