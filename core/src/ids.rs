//! Sort identifiers. The source implementation binds pods, namespaces,
//! policies and interned label values to bit-vector sorts of exactly the
//! width needed to represent the population (`⌈log₂(n+1)⌉`). This rendition
//! keeps the *invariant* (the width is still the thing that bounds
//! `ResourceExhaustion`), but represents every sort as a plain `u32` newtype
//! rather than a packed bit-vector, since there's no SMT backend here to
//! exploit the packing.

/// Stable index of a pod within one build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PodId(pub u32);

/// Stable index of a namespace within one build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespaceId(pub u32);

/// Stable index of a policy within one build.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId(pub u32);

/// An interned label value. Fixed at 32 bits per the value-sort width in the
/// data model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueToken(pub u32);

macro_rules! index_conversions {
    ($t:ty) => {
        impl $t {
            #[inline]
            pub fn as_u32(self) -> u32 {
                self.0
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $t {
            #[inline]
            fn from(i: usize) -> Self {
                Self(i as u32)
            }
        }
    };
}

index_conversions!(PodId);
index_conversions!(NamespaceId);
index_conversions!(PolicyId);
index_conversions!(ValueToken);

/// The bit width needed to represent `n` distinct values plus one
/// "unassigned" sentinel, i.e. `⌈log₂(n+1)⌉`. Retained from the source sort
/// sizing even though nothing here packs bits, because it is the quantity
/// `ResourceExhaustion` is defined against for the value sort.
pub fn sort_width(n: usize) -> u32 {
    let mut bits = 0u32;
    let mut capacity: u64 = 1;
    while capacity < n as u64 + 1 {
        capacity <<= 1;
        bits += 1;
    }
    bits
}
