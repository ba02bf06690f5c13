use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier used for mesh entities.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Largest 0-based index an `Id` can represent.
    pub const MAX_INDEX: usize = (u32::MAX - 1) as usize;

    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// `u32::MAX` has no slot of its own and saturates to `MAX_INDEX`.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Create an Id from a `usize` position, or `None` past `MAX_INDEX`.
    pub fn try_from_usize(index: usize) -> Option<Self> {
        let raw = u32::try_from(index).ok()?.checked_add(1)?;
        NonZeroU32::new(raw).map(Self)
    }

    /// Create an Id from a position in an array of an already built mesh.
    ///
    /// `MeshBuilder::build` refuses entity counts past `MAX_INDEX`, so the
    /// saturation here is never reached for indices into a `Mesh`.
    pub fn from_usize(index: usize) -> Self {
        Self::try_from_usize(index).unwrap_or(Self(NonZeroU32::MAX))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Recover the 0-based index as `usize` for slice access.
    #[inline]
    pub fn idx(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type VertexId = Id;
pub type CellId = Id;
pub type FacetId = Id;

/// Region (segment) tag attached to every cell.
///
/// Regions are user-chosen small integers (e.g. segment numbers of a device
/// mesh), so they are not required to be contiguous.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}", self.0)
    }
}
