//! Target registry integration tests: dense packing, swap-removal and
//! handle validity under long register/unregister sequences.

use rustc_hash::FxHashMap;

use tweencore::error::TweenError;
use tweencore::resources::targetregistry::{TargetId, TargetRegistry};

fn assert_mapped(registry: &TargetRegistry<u64>, id: TargetId) {
    let slot = registry.index_of(id).unwrap();
    assert_eq!(registry.id_at(slot), Some(id));
    assert_eq!(registry.ids()[slot], id);
}

// =============================================================================
// Swap-removal
// =============================================================================

#[test]
fn unregister_middle_moves_last_into_hole() {
    let mut registry = TargetRegistry::new();
    let (a, b, c) = (TargetId(10), TargetId(20), TargetId(30));
    registry.register(1_u64, a);
    registry.register(2_u64, b);
    registry.register(3_u64, c);

    assert_eq!(registry.unregister(b), Some(2));

    assert_eq!(registry.count(), 2);
    assert_eq!(registry.index_of(b), Err(TweenError::NotRegistered(b)));
    assert_mapped(&registry, a);
    assert_mapped(&registry, c);
    assert_eq!(registry.objects(), &[1, 3]);
    registry.check_consistency().unwrap();
}

#[test]
fn unregister_last_and_only() {
    let mut registry = TargetRegistry::new();
    registry.register(1_u64, TargetId(1));
    registry.register(2_u64, TargetId(2));

    registry.unregister(TargetId(2));
    assert_mapped(&registry, TargetId(1));
    registry.check_consistency().unwrap();

    registry.unregister(TargetId(1));
    assert!(registry.is_empty());
    registry.check_consistency().unwrap();

    // second unregister is a no-op
    assert_eq!(registry.unregister(TargetId(1)), None);
    registry.check_consistency().unwrap();
}

#[test]
fn bulk_view_reaches_every_live_object_once() {
    let mut registry = TargetRegistry::new();
    for i in 0..8 {
        registry.register(0_u64, TargetId(i));
    }
    registry.unregister(TargetId(3));
    registry.unregister(TargetId(0));
    for object in registry.objects_mut() {
        *object += 1;
    }
    assert_eq!(registry.objects().len(), 6);
    assert!(registry.objects().iter().all(|&o| o == 1));
}

// =============================================================================
// Handles
// =============================================================================

#[test]
fn handle_outlives_swap_removal_of_other_ids() {
    let mut registry = TargetRegistry::new();
    let first = registry.register(100_u64, TargetId(1));
    registry.register(200_u64, TargetId(2));
    let last = registry.register(300_u64, TargetId(3));

    registry.unregister(TargetId(1));

    // the moved target is still found through its handle
    assert_eq!(registry.get(last), Ok(&300));
    assert_eq!(registry.get(first), Err(TweenError::NotRegistered(TargetId(1))));
}

#[test]
fn reregistered_id_invalidates_old_handles() {
    let mut registry = TargetRegistry::new();
    let old = registry.register(1_u64, TargetId(5));
    registry.unregister(TargetId(5));
    let new = registry.register(2_u64, TargetId(5));

    assert_ne!(old, new);
    assert_eq!(registry.get(old), Err(TweenError::StaleHandle(TargetId(5))));
    assert_eq!(registry.get(new), Ok(&2));
    // releasing through the stale handle does not touch the new registration
    assert!(!registry.release(old));
    assert!(registry.contains(TargetId(5)));
}

#[test]
fn release_keeps_the_object_registered() {
    let mut registry = TargetRegistry::new();
    let handle = registry.register(1_u64, TargetId(1));
    registry.retain(handle).unwrap();
    registry.retain(handle).unwrap();

    assert!(!registry.release(handle));
    assert_eq!(registry.ref_count(handle), Ok(1));
    assert!(registry.release(handle));
    assert_eq!(registry.ref_count(handle), Ok(0));
    assert_eq!(registry.get(handle), Ok(&1));
    // the host still owns the removal
    assert_eq!(registry.unregister(TargetId(1)), Some(1));
}

#[test]
fn clear_keeps_old_handles_stale() {
    let mut registry = TargetRegistry::new();
    let old = registry.register(1_u64, TargetId(1));
    registry.clear();
    assert!(registry.is_empty());
    let new = registry.register(1_u64, TargetId(1));
    assert_eq!(registry.get(old), Err(TweenError::StaleHandle(TargetId(1))));
    assert!(registry.get(new).is_ok());
}

// =============================================================================
// Randomized sequences
// =============================================================================

#[test]
fn randomized_sequences_keep_tables_consistent() {
    for seed in [1_u64, 7, 42, 0xdead_beef] {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut registry = TargetRegistry::with_capacity(16);
        let mut model: FxHashMap<TargetId, u64> = FxHashMap::default();

        for step in 0..4000 {
            let id = TargetId(rng.u64(..48));
            if rng.u8(..3) > 0 {
                let handle = registry.register(step, id);
                model.entry(id).or_insert(step);
                assert_eq!(registry.handle_of(id), Ok(handle));
            } else {
                assert_eq!(registry.unregister(id), model.remove(&id));
            }
            if let Err(e) = registry.check_consistency() {
                panic!("seed {seed} step {step}: {e}");
            }
            assert_eq!(registry.count(), model.len());
        }

        for (id, object) in &model {
            assert_mapped(&registry, *id);
            let handle = registry.handle_of(*id).unwrap();
            assert_eq!(registry.get(handle), Ok(object));
        }
    }
}
