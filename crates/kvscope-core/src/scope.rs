//! Scope resolution: mapping logical keys to per-owner physical keys.
//!
//! In isolated mode two owners of the same logical key must not share
//! state, while followers of that key attach to whichever owner is
//! current. The table tracks one slot per logical key holding either a
//! pending physical key (followers arrived before any owner) or a bound
//! one (an owner has claimed it).
//!
//! ## Protocol
//!
//! * An owner claims a pending slot if one exists, otherwise allocates a
//!   fresh physical key. Allocation replaces any previous binding, so
//!   followers that resolve afterwards join the newest owner.
//! * A follower attaches to the slot if present, otherwise creates a
//!   pending one and waits for an owner to claim it.
//! * Releasing is guarded by the physical key, so an owner whose slot was
//!   replaced cannot tear down its successor's binding.

use std::collections::HashMap;
use std::fmt;

/// A per-owner storage key, derived from the logical key and an
/// allocation sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalKey(String);

impl PhysicalKey {
    fn allocate(logical: &str, seq: u64) -> Self {
        Self(format!("{logical}.{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PhysicalKey> for String {
    fn from(key: PhysicalKey) -> String {
        key.0
    }
}

/// Where a logical key currently stands in the binding protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeState {
    /// No slot exists for the key.
    Unbound,
    /// Followers created the slot; no owner has claimed it yet.
    Pending(PhysicalKey),
    /// An owner holds the slot.
    Bound(PhysicalKey),
}

/// Outcome of an owner resolving a logical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerResolution {
    /// Followers were already waiting; the owner adopted their physical
    /// key and must treat their subscriptions as live.
    ClaimedPending(PhysicalKey),
    /// A fresh physical key was allocated for this owner.
    Allocated(PhysicalKey),
}

impl OwnerResolution {
    /// The physical key the owner will work under either way.
    pub fn physical(&self) -> &PhysicalKey {
        match self {
            Self::ClaimedPending(key) | Self::Allocated(key) => key,
        }
    }
}

/// Outcome of a follower resolving a logical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowerResolution {
    /// A slot already existed; the follower joins it.
    Attached(PhysicalKey),
    /// No slot existed; a pending one was created for a future owner to
    /// claim.
    CreatedPending(PhysicalKey),
}

impl FollowerResolution {
    pub fn physical(&self) -> &PhysicalKey {
        match self {
            Self::Attached(key) | Self::CreatedPending(key) => key,
        }
    }
}

enum Slot {
    Pending(PhysicalKey),
    Bound(PhysicalKey),
}

impl Slot {
    fn physical(&self) -> &PhysicalKey {
        match self {
            Self::Pending(key) | Self::Bound(key) => key,
        }
    }
}

/// One slot per logical key plus the allocation counter.
///
/// The counter is shared across keys and never reset, so physical keys
/// are unique for the lifetime of the table even after releases.
#[derive(Default)]
pub struct ScopeTable {
    slots: HashMap<String, Slot>,
    next_seq: u64,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, logical: &str) -> PhysicalKey {
        self.next_seq += 1;
        PhysicalKey::allocate(logical, self.next_seq)
    }

    /// Resolve a logical key on behalf of a mounting owner.
    pub fn resolve_owner(&mut self, logical: &str) -> OwnerResolution {
        if let Some(Slot::Pending(key)) = self.slots.get(logical) {
            let key = key.clone();
            self.slots
                .insert(logical.to_owned(), Slot::Bound(key.clone()));
            return OwnerResolution::ClaimedPending(key);
        }

        // Absent or already bound: this owner gets its own allocation and
        // the slot now points at it.
        let key = self.allocate(logical);
        self.slots
            .insert(logical.to_owned(), Slot::Bound(key.clone()));
        OwnerResolution::Allocated(key)
    }

    /// Resolve a logical key on behalf of a mounting follower.
    pub fn resolve_follower(&mut self, logical: &str) -> FollowerResolution {
        if let Some(slot) = self.slots.get(logical) {
            return FollowerResolution::Attached(slot.physical().clone());
        }

        let key = self.allocate(logical);
        self.slots
            .insert(logical.to_owned(), Slot::Pending(key.clone()));
        FollowerResolution::CreatedPending(key)
    }

    /// Release an owner's binding.
    ///
    /// Removes the slot only while it still points at `physical`; a
    /// replaced owner unmounting late leaves its successor untouched.
    /// Returns whether the slot was removed.
    pub fn release_owner(&mut self, logical: &str, physical: &PhysicalKey) -> bool {
        match self.slots.get(logical) {
            Some(slot) if slot.physical() == physical => {
                self.slots.remove(logical);
                true
            }
            _ => false,
        }
    }

    /// Current binding state of a logical key.
    pub fn state(&self, logical: &str) -> ScopeState {
        match self.slots.get(logical) {
            None => ScopeState::Unbound,
            Some(Slot::Pending(key)) => ScopeState::Pending(key.clone()),
            Some(Slot::Bound(key)) => ScopeState::Bound(key.clone()),
        }
    }

    /// Number of logical keys with a live slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_owner_allocates_seq_one() {
        let mut table = ScopeTable::new();
        let resolution = table.resolve_owner("x");
        assert_eq!(
            resolution,
            OwnerResolution::Allocated(PhysicalKey("x.1".into()))
        );
        assert_eq!(table.state("x"), ScopeState::Bound(PhysicalKey("x.1".into())));
    }

    #[test]
    fn test_counter_is_global_across_keys() {
        let mut table = ScopeTable::new();
        assert_eq!(table.resolve_owner("x").physical().as_str(), "x.1");
        assert_eq!(table.resolve_owner("y").physical().as_str(), "y.2");
        assert_eq!(table.resolve_follower("z").physical().as_str(), "z.3");
    }

    #[test]
    fn test_owner_claims_pending_slot_from_followers() {
        let mut table = ScopeTable::new();

        let follower = table.resolve_follower("theme");
        let pending = match &follower {
            FollowerResolution::CreatedPending(key) => key.clone(),
            other => panic!("expected pending slot, got {other:?}"),
        };
        assert_eq!(table.state("theme"), ScopeState::Pending(pending.clone()));

        let owner = table.resolve_owner("theme");
        assert_eq!(owner, OwnerResolution::ClaimedPending(pending.clone()));
        assert_eq!(table.state("theme"), ScopeState::Bound(pending));
    }

    #[test]
    fn test_followers_attach_to_bound_and_pending_slots() {
        let mut table = ScopeTable::new();

        let owner = table.resolve_owner("a");
        assert_eq!(
            table.resolve_follower("a"),
            FollowerResolution::Attached(owner.physical().clone())
        );

        let first = table.resolve_follower("b");
        let second = table.resolve_follower("b");
        assert_eq!(
            second,
            FollowerResolution::Attached(first.physical().clone())
        );
    }

    #[test]
    fn test_second_owner_gets_its_own_allocation_and_takes_the_slot() {
        let mut table = ScopeTable::new();

        let first = table.resolve_owner("x");
        let second = table.resolve_owner("x");

        assert_ne!(first.physical(), second.physical());
        assert!(matches!(second, OwnerResolution::Allocated(_)));

        // Later followers land on the newest owner.
        assert_eq!(
            table.resolve_follower("x"),
            FollowerResolution::Attached(second.physical().clone())
        );
    }

    #[test]
    fn test_release_removes_only_the_matching_binding() {
        let mut table = ScopeTable::new();

        let first = table.resolve_owner("x");
        let second = table.resolve_owner("x");

        // The replaced owner unmounts late; the live binding survives.
        assert!(!table.release_owner("x", first.physical()));
        assert_eq!(
            table.state("x"),
            ScopeState::Bound(second.physical().clone())
        );

        assert!(table.release_owner("x", second.physical()));
        assert_eq!(table.state("x"), ScopeState::Unbound);

        // Releasing again is a no-op.
        assert!(!table.release_owner("x", second.physical()));
    }

    #[test]
    fn test_release_then_remount_allocates_fresh() {
        let mut table = ScopeTable::new();

        let first = table.resolve_owner("x");
        table.release_owner("x", first.physical());

        let second = table.resolve_owner("x");
        assert!(matches!(second, OwnerResolution::Allocated(_)));
        assert_ne!(first.physical(), second.physical());
    }

    proptest! {
        #[test]
        fn test_repeated_owner_allocations_never_collide(count in 1usize..32) {
            let mut table = ScopeTable::new();
            let mut seen = std::collections::HashSet::new();
            for _ in 0..count {
                let resolution = table.resolve_owner("k");
                let physical = resolution.physical().as_str().to_owned();
                prop_assert!(physical.starts_with("k."));
                prop_assert!(seen.insert(physical));
            }
            prop_assert_eq!(table.len(), 1);
        }
    }
}
