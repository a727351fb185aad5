//! Arena handle types
//!
//! Regions and point records live in slot maps so that parent links and
//! point identities are stable keys rather than owning references.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a region stored in a [`RegionTree`](crate::spatial::RegionTree)
    pub struct RegionKey;

    /// Stable identity of a point owned by a [`WorldIndex`](crate::spatial::WorldIndex)
    pub struct PointId;
}

/// Handle-based map of regions
pub type RegionMap<T> = SlotMap<RegionKey, T>;

/// Handle-based map of point records
pub type PointMap<T> = SlotMap<PointId, T>;
