use crate::table::DenseMap;

#[test]
fn erase_removes_key_and_preserves_others() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    map.insert(1, 10);
    map.insert(2, 20);
    map.insert(3, 30);

    assert_eq!(map.erase(&1), 1);
    assert_eq!(map.len(), 2);
    assert!(!map.contains(&1));
    assert_eq!(map.find(&2), Some(&20));
    assert_eq!(map.find(&3), Some(&30));
}

#[test]
fn erase_missing_key_is_a_no_op() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    map.insert(1, 10);
    assert_eq!(map.erase(&999), 0);
    assert_eq!(map.len(), 1);
}

#[test]
fn erase_then_reinsert_same_key() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    map.insert(1, 10);
    map.erase(&1);
    let (_, inserted) = map.insert(1, 30);
    assert!(inserted);
    assert_eq!(map.find(&1), Some(&30));
    assert_eq!(map.len(), 1);
}

#[test]
fn dense_packing_after_interleaved_insert_erase() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    for i in 0..100 {
        map.insert(i, i * 2);
    }
    for i in 25..30 {
        map.erase(&i);
    }
    assert_eq!(map.len(), 95);
    for i in 25..30 {
        assert!(!map.contains(&i));
    }
    for i in (0..25).chain(30..100) {
        assert_eq!(map.find(&i), Some(&(i * 2)));
    }
    // Iteration yields exactly `len` entries, all live.
    assert_eq!(map.iter().count(), map.len());
}

#[test]
fn erasing_every_entry_leaves_an_empty_consistent_table() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    for i in 0..200 {
        map.insert(i, i);
    }
    for i in 0..200 {
        assert_eq!(map.erase(&i), 1);
    }
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    for i in 0..200 {
        assert!(!map.contains(&i));
    }
    // table should still accept fresh inserts after being drained
    map.insert(1, 1);
    assert_eq!(map.find(&1), Some(&1));
}

#[test]
fn erase_middle_then_verify_tail_entry_moved_correctly() {
    // Exercises the entry-store swap_remove + bucket fix-up path directly:
    // erase a key that is not last in insertion order, then confirm every
    // other key (including whichever was physically last) is still found.
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    for i in 0..10 {
        map.insert(i, i * 100);
    }
    assert_eq!(map.erase(&3), 1);
    assert_eq!(map.len(), 9);
    for i in (0..10).filter(|&i| i != 3) {
        assert_eq!(map.find(&i), Some(&(i * 100)));
    }
}
