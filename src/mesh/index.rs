//! Typed indices for mesh elements.
//!
//! Vertices, half-edges, undirected edges, and faces live in four disjoint
//! index spaces. Each space gets its own `u32` newtype so they cannot be
//! mixed up, and all four share a single reserved sentinel, [`INVALID_INDEX`].
//! Indices are dense: elements are created append-only and nothing short of
//! a full `clear` removes them.

use std::fmt::{self, Debug};

use bytemuck::{Pod, Zeroable};

/// Reserved sentinel shared by all four index spaces.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Check that `idx` is not the sentinel and addresses an element of a
/// `len`-element array.
#[inline]
pub const fn is_valid_index(idx: u32, len: usize) -> bool {
    idx != INVALID_INDEX && (idx as usize) < len
}

/// A vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// An undirected edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// A face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create an index from an array position.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID_INDEX as usize);
                Self(index as u32)
            }

            /// Create an index from a raw `u32` value.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// The invalid sentinel index.
            #[inline]
            pub const fn invalid() -> Self {
                Self(INVALID_INDEX)
            }

            /// The array position this index addresses.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// The raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Check that this is not the sentinel.
            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX
            }

            /// Check that this index addresses an element of a `len`-element
            /// array.
            #[inline]
            pub const fn in_bounds(self, len: usize) -> bool {
                is_valid_index(self.0, len)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(EdgeId, "E");
impl_index_type!(FaceId, "F");

/// Encode a directed vertex pair as a single map key.
///
/// Total and injective on 32-bit pairs: `(from << 32) | to`.
#[inline]
pub fn directed_edge_key(from: VertexId, to: VertexId) -> u64 {
    ((from.raw() as u64) << 32) | (to.raw() as u64)
}

/// Encode an undirected vertex pair as a single map key.
///
/// Canonicalizes to `(min << 32) | max` so both directions collide.
#[inline]
pub fn undirected_edge_key(a: VertexId, b: VertexId) -> u64 {
    if a.raw() <= b.raw() {
        directed_edge_key(a, b)
    } else {
        directed_edge_key(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        let v = VertexId::new(42);
        assert!(v.is_valid());
        assert_eq!(v.index(), 42);
        assert_eq!(v.raw(), 42);

        let invalid = VertexId::invalid();
        assert!(!invalid.is_valid());
        assert!(!invalid.in_bounds(usize::MAX));

        assert!(is_valid_index(0, 1));
        assert!(!is_valid_index(1, 1));
        assert!(!is_valid_index(INVALID_INDEX, usize::MAX));
    }

    #[test]
    fn default_is_invalid() {
        assert!(!HalfEdgeId::default().is_valid());
        assert!(!EdgeId::default().is_valid());
        assert!(!FaceId::default().is_valid());
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(7)), "V(7)");
        assert_eq!(format!("{:?}", HalfEdgeId::invalid()), "HE(INVALID)");
        assert_eq!(format!("{:?}", FaceId::new(0)), "F(0)");
    }

    #[test]
    fn directed_key_is_injective_on_order() {
        let a = VertexId::new(3);
        let b = VertexId::new(9);
        assert_ne!(directed_edge_key(a, b), directed_edge_key(b, a));
        assert_eq!(directed_edge_key(a, b), (3u64 << 32) | 9);
    }

    #[test]
    fn undirected_key_is_canonical() {
        let a = VertexId::new(3);
        let b = VertexId::new(9);
        assert_eq!(undirected_edge_key(a, b), undirected_edge_key(b, a));
        assert_eq!(undirected_edge_key(b, a), (3u64 << 32) | 9);
        assert_eq!(undirected_edge_key(a, a), (3u64 << 32) | 3);
    }
}
