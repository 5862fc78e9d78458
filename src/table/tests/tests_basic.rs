use crate::table::DenseMap;
use crate::DenseMapError;

#[test]
fn round_trip_distinct_keys() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    for i in 0..1000 {
        map.insert(i, i * 2);
    }
    assert_eq!(map.len(), 1000);
    for i in 0..1000 {
        assert_eq!(map.find(&i), Some(&(i * 2)));
    }
}

#[test]
fn duplicate_insert_does_not_mutate() {
    let mut map: DenseMap<&str, i32> = DenseMap::new();
    let (idx1, inserted1) = map.insert("a", 1);
    assert!(inserted1);
    let (idx2, inserted2) = map.insert("a", 999);
    assert!(!inserted2);
    assert_eq!(idx1, idx2);
    assert_eq!(map.find(&"a"), Some(&1));
}

#[test]
fn try_emplace_does_not_construct_on_duplicate() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    map.insert(1, 10);

    let mut constructed = false;
    let (_, inserted) = map.try_emplace(1, || {
        constructed = true;
        20
    });
    assert!(!inserted);
    assert!(!constructed, "try_emplace must not construct on a duplicate key");
    assert_eq!(map.find(&1), Some(&10));
}

#[test]
fn emplace_constructs_even_on_duplicate() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    map.insert(1, 10);

    let mut constructed = false;
    let (_, inserted) = map.emplace(1, || {
        constructed = true;
        20
    });
    assert!(!inserted);
    assert!(constructed, "emplace always constructs, even if the result is discarded");
    assert_eq!(map.find(&1), Some(&10));
}

#[test]
fn contains_count_len_is_empty() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    map.insert(1, 1);
    assert!(map.contains(&1));
    assert_eq!(map.count(&1), 1);
    assert_eq!(map.count(&2), 0);
    assert!(!map.is_empty());
    assert_eq!(map.len(), 1);
}

#[test]
fn clear_resets_size_but_keeps_capacity_floor() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    for i in 0..100 {
        map.insert(i, i);
    }
    map.clear();
    assert_eq!(map.len(), 0);
    assert!(map.capacity() >= crate::INITIAL_CAPACITY);
    assert!(!map.contains(&5));
}

#[test]
fn index_and_at() {
    let mut map: DenseMap<&str, i32> = DenseMap::new();
    map.insert("x", 42);
    assert_eq!(map[&"x"], 42);
    assert_eq!(map.at(&"x"), Ok(&42));
    assert_eq!(map.at(&"missing"), Err(DenseMapError::KeyNotFound));
}

#[test]
#[should_panic(expected = "key not found")]
fn index_panics_on_missing_key() {
    let map: DenseMap<&str, i32> = DenseMap::new();
    let _ = map[&"missing"];
}

#[test]
fn get_or_insert_default_creates_then_reuses() {
    let mut map: DenseMap<&str, Vec<i32>> = DenseMap::new();
    map.get_or_insert_default("list").push(1);
    map.get_or_insert_default("list").push(2);
    assert_eq!(map.find(&"list"), Some(&vec![1, 2]));
}

#[test]
fn find_mut_allows_in_place_update() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    map.insert(1, 10);
    *map.find_mut(&1).unwrap() += 5;
    assert_eq!(map.find(&1), Some(&15));
}

#[test]
fn iteration_visits_every_entry_exactly_once() {
    let mut map: DenseMap<i32, i32> = DenseMap::new();
    for i in 0..50 {
        map.insert(i, i * 10);
    }
    let mut seen: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..50).collect::<Vec<_>>());
}

#[test]
fn string_keys_use_content_hashing() {
    // S6 — disjoint String instances with equal content must collide on lookup.
    let mut map: DenseMap<String, i32> = DenseMap::new();
    map.insert("apple".to_string(), 1);
    map.insert("banana".to_string(), 2);
    map.insert("cherry".to_string(), 3);
    assert_eq!(map.find(&"apple".to_string()), Some(&1));
    map.erase(&"apple".to_string());
    assert_eq!(map.len(), 2);
    assert_eq!(map.find(&"banana".to_string()), Some(&2));
    assert!(!map.contains(&"apple".to_string()));
}
