//! External target registry.
//!
//! Maps a stable [`TargetId`] to a slot in a dense array of external objects
//! and back. Slots never have holes: unregistering swaps the last slot into
//! the freed position, so bulk passes over [`TargetRegistry::objects_mut`]
//! touch every live target exactly once without any per-object lookup.
//!
//! # Invariants
//!
//! - `slots[ids[s]] == s` for every slot `s < count()`
//! - `ids`, `objects`, `epochs` and `refs` always have the same length
//!
//! # Handles
//!
//! Every registration takes a fresh epoch from a monotonic counter. A
//! [`TargetHandle`] remembers the epoch it was issued for, so a handle kept
//! across an unregister/register cycle of the same id resolves to
//! [`TweenError::StaleHandle`] instead of silently aliasing the new object.
//!
//! Records retain the target they tween and release it when destroyed. The
//! count is informational: objects are owned by the host and only leave the
//! registry through [`TargetRegistry::unregister`].
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = TargetRegistry::<Transform>::new();
//! let handle = registry.register(Transform::default(), TargetId(7));
//! registry.get_mut(handle)?.position.x = 3.0;
//! registry.unregister(TargetId(7));
//! ```

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::TweenError;

/// Stable identifier chosen by the host for an external object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

/// Reference from a tween record to one registration of an external object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle {
    pub id: TargetId,
    pub epoch: u32,
}

/// Dense registry of external objects of kind `O`.
#[derive(Resource)]
pub struct TargetRegistry<O: Send + Sync + 'static> {
    objects: Vec<O>,
    /// slot -> id
    ids: Vec<TargetId>,
    /// slot -> registration epoch
    epochs: Vec<u32>,
    /// slot -> number of live records retaining the target
    refs: Vec<u32>,
    /// id -> slot
    slots: FxHashMap<TargetId, usize>,
    next_epoch: u32,
}

impl<O: Send + Sync + 'static> Default for TargetRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Send + Sync + 'static> TargetRegistry<O> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty registry with room for `capacity` targets.
    pub fn with_capacity(capacity: usize) -> Self {
        TargetRegistry {
            objects: Vec::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            epochs: Vec::with_capacity(capacity),
            refs: Vec::with_capacity(capacity),
            slots: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_epoch: 0,
        }
    }

    /// Register `object` under `id` and return a handle to it.
    ///
    /// If `id` is already registered this is a no-op: `object` is dropped and
    /// the handle of the existing registration is returned.
    pub fn register(&mut self, object: O, id: TargetId) -> TargetHandle {
        if let Some(&slot) = self.slots.get(&id) {
            return TargetHandle {
                id,
                epoch: self.epochs[slot],
            };
        }
        let slot = self.objects.len();
        let epoch = self.next_epoch;
        self.next_epoch = self.next_epoch.wrapping_add(1);

        self.objects.push(object);
        self.ids.push(id);
        self.epochs.push(epoch);
        self.refs.push(0);
        self.slots.insert(id, slot);
        log::trace!("registered target {:?} at slot {}", id, slot);
        TargetHandle { id, epoch }
    }

    /// Unregister `id`, returning its object. No-op (returns `None`) if not registered.
    ///
    /// The last slot is moved into the freed position, so this is O(1) and
    /// never shifts unrelated slots.
    pub fn unregister(&mut self, id: TargetId) -> Option<O> {
        let slot = self.slots.remove(&id)?;
        let last = self.objects.len() - 1;

        let object = self.objects.swap_remove(slot);
        self.ids.swap_remove(slot);
        self.epochs.swap_remove(slot);
        self.refs.swap_remove(slot);

        if slot != last {
            let moved = self.ids[slot];
            self.slots.insert(moved, slot);
        }
        log::trace!("unregistered target {:?} from slot {}", id, slot);
        Some(object)
    }

    /// Slot currently holding `id`.
    pub fn index_of(&self, id: TargetId) -> Result<usize, TweenError> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(TweenError::NotRegistered(id))
    }

    /// Id stored at `slot`, if the slot is occupied.
    pub fn id_at(&self, slot: usize) -> Option<TargetId> {
        self.ids.get(slot).copied()
    }

    /// Handle of the current registration of `id`.
    pub fn handle_of(&self, id: TargetId) -> Result<TargetHandle, TweenError> {
        let slot = self.index_of(id)?;
        Ok(TargetHandle {
            id,
            epoch: self.epochs[slot],
        })
    }

    /// Returns `true` if `id` has a live slot.
    pub fn contains(&self, id: TargetId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Resolve a handle to its current slot, rejecting handles from older registrations.
    pub fn resolve(&self, handle: TargetHandle) -> Result<usize, TweenError> {
        let slot = self.index_of(handle.id)?;
        if self.epochs[slot] != handle.epoch {
            return Err(TweenError::StaleHandle(handle.id));
        }
        Ok(slot)
    }

    pub fn get(&self, handle: TargetHandle) -> Result<&O, TweenError> {
        let slot = self.resolve(handle)?;
        Ok(&self.objects[slot])
    }

    pub fn get_mut(&mut self, handle: TargetHandle) -> Result<&mut O, TweenError> {
        let slot = self.resolve(handle)?;
        Ok(&mut self.objects[slot])
    }

    /// Record that one more tween references the target.
    pub fn retain(&mut self, handle: TargetHandle) -> Result<(), TweenError> {
        let slot = self.resolve(handle)?;
        self.refs[slot] += 1;
        Ok(())
    }

    /// Drop one tween reference.
    ///
    /// The object stays registered: it belongs to the host, which removes it
    /// with [`unregister`](Self::unregister). Stale or unknown handles are
    /// ignored, their registration is already gone.
    /// Returns `true` if this call dropped the last reference.
    pub fn release(&mut self, handle: TargetHandle) -> bool {
        let Ok(slot) = self.resolve(handle) else {
            return false;
        };
        if self.refs[slot] == 0 {
            return false;
        }
        self.refs[slot] -= 1;
        self.refs[slot] == 0
    }

    /// Number of tweens retaining the target behind `handle`.
    pub fn ref_count(&self, handle: TargetHandle) -> Result<u32, TweenError> {
        let slot = self.resolve(handle)?;
        Ok(self.refs[slot])
    }

    /// Number of registered targets.
    pub fn count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Dense array of all live objects, in slot order.
    pub fn objects(&self) -> &[O] {
        &self.objects
    }

    /// Mutable dense array of all live objects, in slot order.
    pub fn objects_mut(&mut self) -> &mut [O] {
        &mut self.objects
    }

    /// Ids in slot order; `ids()[s]` owns `objects()[s]`.
    pub fn ids(&self) -> &[TargetId] {
        &self.ids
    }

    /// Drop every registration. Epochs keep counting, so old handles stay stale.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.ids.clear();
        self.epochs.clear();
        self.refs.clear();
        self.slots.clear();
    }

    /// Verify that both mapping tables agree with each other and with the dense array.
    pub fn check_consistency(&self) -> Result<(), String> {
        let n = self.objects.len();
        if self.ids.len() != n || self.epochs.len() != n || self.refs.len() != n {
            return Err(format!(
                "column length mismatch: objects={} ids={} epochs={} refs={}",
                n,
                self.ids.len(),
                self.epochs.len(),
                self.refs.len()
            ));
        }
        if self.slots.len() != n {
            return Err(format!("{} ids mapped for {} slots", self.slots.len(), n));
        }
        for (slot, id) in self.ids.iter().enumerate() {
            match self.slots.get(id) {
                Some(&s) if s == slot => {}
                Some(&s) => {
                    return Err(format!("{:?} stored at slot {} but mapped to {}", id, slot, s));
                }
                None => return Err(format!("{:?} at slot {} has no mapping", id, slot)),
            }
        }
        Ok(())
    }
}
