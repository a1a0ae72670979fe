//! Shared data types.

/// A point paired with its position in the caller's input sequence.
///
/// Used wherever the working set is reordered or shrunk, so the final match set
/// can still be mapped back to input indices.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint<P> {
    /// Position in the original input.
    pub index: usize,
    pub point: P,
}

impl<P> IndexedPoint<P> {
    pub fn new(index: usize, point: P) -> Self {
        Self { index, point }
    }
}
