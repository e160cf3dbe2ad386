//! Reusable slot allocator for transient entities
//!
//! Slots are handed out round-robin starting just past the last one spawned,
//! so reuse spreads over the whole pool instead of hammering the low indices.
//! The pool grows by one when every slot is taken and never shrinks.

use std::ops::{Index, IndexMut};

/// Pool bookkeeping every pooled type carries
pub trait Poolable {
    fn in_use(&self) -> bool;
    fn set_in_use(&mut self, in_use: bool);
}

/// Index of a slot inside one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolSlot(pub usize);

/// Growable pool of `T`, the sole owner of its slots
pub struct ObjectPool<T> {
    slots: Vec<T>,
    last_spawned: Option<usize>,
    factory: Box<dyn Fn() -> T>,
}

impl<T: Poolable> ObjectPool<T> {
    /// Pre-fill `capacity` slots using `factory`
    ///
    /// `capacity` is only a starting size; `spawn` grows the pool on demand.
    pub fn new(capacity: usize, factory: impl Fn() -> T + 'static) -> Self {
        let slots = (0..capacity).map(|_| factory()).collect();
        Self {
            slots,
            last_spawned: None,
            factory: Box::new(factory),
        }
    }

    /// Claim a free slot, growing the pool if none is free
    ///
    /// Never fails. The returned slot still holds whatever its previous
    /// occupant left behind; callers run an initializer over it.
    pub fn spawn(&mut self) -> PoolSlot {
        let start = self.last_spawned.map_or(0, |i| i + 1);
        let len = self.slots.len();

        let free = (start..len)
            .chain(0..start.min(len))
            .find(|&i| !self.slots[i].in_use());

        let index = match free {
            Some(i) => i,
            None => {
                self.slots.push((self.factory)());
                log::debug!("Pool grew to {} slots", self.slots.len());
                len
            }
        };

        self.slots[index].set_in_use(true);
        self.last_spawned = Some(index);
        PoolSlot(index)
    }

    /// Return a slot to the pool; its contents are left untouched
    pub fn kill(&mut self, slot: PoolSlot) {
        self.slots[slot.0].set_in_use(false);
    }

    /// Mark every slot free
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.set_in_use(false);
        }
    }

    pub fn get(&self, slot: PoolSlot) -> Option<&T> {
        self.slots.get(slot.0)
    }

    pub fn get_mut(&mut self, slot: PoolSlot) -> Option<&mut T> {
        self.slots.get_mut(slot.0)
    }

    /// Every slot, in use or not (bulk maintenance such as texture reloads)
    pub fn all(&self) -> &[T] {
        &self.slots
    }

    pub fn all_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|s| s.in_use()).count()
    }

    pub fn last_spawned(&self) -> Option<PoolSlot> {
        self.last_spawned.map(PoolSlot)
    }
}

impl<T> Index<PoolSlot> for ObjectPool<T> {
    type Output = T;

    fn index(&self, slot: PoolSlot) -> &T {
        &self.slots[slot.0]
    }
}

impl<T> IndexMut<PoolSlot> for ObjectPool<T> {
    fn index_mut(&mut self, slot: PoolSlot) -> &mut T {
        &mut self.slots[slot.0]
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("len", &self.slots.len())
            .field("last_spawned", &self.last_spawned)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Default)]
    struct Slot {
        in_use: bool,
        payload: u32,
    }

    impl Poolable for Slot {
        fn in_use(&self) -> bool {
            self.in_use
        }

        fn set_in_use(&mut self, in_use: bool) {
            self.in_use = in_use;
        }
    }

    fn pool(capacity: usize) -> ObjectPool<Slot> {
        ObjectPool::new(capacity, Slot::default)
    }

    #[test]
    fn test_spawn_marks_in_use() {
        let mut p = pool(3);
        let s = p.spawn();
        assert!(p[s].in_use);
        assert_eq!(p.in_use_count(), 1);
    }

    #[test]
    fn test_kill_frees_without_clearing() {
        let mut p = pool(3);
        let s = p.spawn();
        p[s].payload = 42;
        p.kill(s);
        assert!(!p[s].in_use);
        assert_eq!(p[s].payload, 42);
    }

    #[test]
    fn test_round_robin_skips_recently_freed_slot() {
        let mut p = pool(4);
        let a = p.spawn();
        assert_eq!(a, PoolSlot(0));
        p.kill(a);
        // Slot 0 is free again but the scan resumes after it
        assert_eq!(p.spawn(), PoolSlot(1));
        assert_eq!(p.spawn(), PoolSlot(2));
        assert_eq!(p.spawn(), PoolSlot(3));
        // Wrap around to the freed slot
        assert_eq!(p.spawn(), PoolSlot(0));
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_wraparound_resumes_after_last_index() {
        let mut p = pool(5);
        for _ in 0..5 {
            p.spawn();
        }
        p.kill(PoolSlot(1));
        p.kill(PoolSlot(3));
        // Last spawned is 4, so the scan wraps to 0.. and finds 1 first
        assert_eq!(p.spawn(), PoolSlot(1));
        // Then resumes strictly after 1
        assert_eq!(p.spawn(), PoolSlot(3));
    }

    #[test]
    fn test_grows_when_full() {
        let mut p = pool(2);
        p.spawn();
        p.spawn();
        let s = p.spawn();
        assert_eq!(s, PoolSlot(2));
        assert_eq!(p.len(), 3);
        assert!(p[s].in_use);
        assert_eq!(p.last_spawned(), Some(PoolSlot(2)));
    }

    #[test]
    fn test_zero_capacity_pool_grows() {
        let mut p = pool(0);
        assert!(p.is_empty());
        assert_eq!(p.spawn(), PoolSlot(0));
        assert_eq!(p.spawn(), PoolSlot(1));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_single_slot_reused_after_kill() {
        let mut p = pool(1);
        let s = p.spawn();
        p.kill(s);
        assert_eq!(p.spawn(), s);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn test_grown_slots_are_scanned() {
        let mut p = pool(1);
        p.spawn();
        p.spawn(); // grows to 2
        p.spawn(); // grows to 3
        p.kill(PoolSlot(2));
        p.kill(PoolSlot(0));
        // Last spawned is 2; wrap finds 0, then the grown slot 2 is reachable
        assert_eq!(p.spawn(), PoolSlot(0));
        assert_eq!(p.spawn(), PoolSlot(2));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_clear_frees_everything() {
        let mut p = pool(3);
        p.spawn();
        p.spawn();
        p.clear();
        assert_eq!(p.in_use_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_size_is_max_of_capacity_and_spawns(capacity in 0usize..40, spawns in 0usize..80) {
            let mut p = pool(capacity);
            for _ in 0..spawns {
                p.spawn();
            }
            prop_assert_eq!(p.len(), capacity.max(spawns));
            prop_assert_eq!(p.in_use_count(), spawns);
        }

        #[test]
        fn prop_never_hands_out_a_busy_slot(
            capacity in 1usize..16,
            ops in proptest::collection::vec(any::<bool>(), 1..200),
        ) {
            let mut p = pool(capacity);
            let mut live: Vec<PoolSlot> = Vec::new();
            let mut previous: Option<PoolSlot> = None;
            for spawn in ops {
                if spawn || live.is_empty() {
                    let busy: Vec<bool> = p.all().iter().map(|s| s.in_use).collect();
                    let s = p.spawn();
                    prop_assert!(s.0 >= busy.len() || !busy[s.0]);
                    if let Some(prev) = previous {
                        // No kill in between means the previous slot is still busy
                        if live.contains(&prev) {
                            prop_assert_ne!(prev, s);
                        }
                    }
                    live.push(s);
                    previous = Some(s);
                } else {
                    let s = live.remove(live.len() / 2);
                    p.kill(s);
                    prop_assert!(!p[s].in_use);
                }
            }
        }
    }
}
