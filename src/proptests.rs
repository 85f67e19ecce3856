use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn validate_map(m: &FixedKeyMap) {
    let cap = m.capacity();
    assert!(
        cap == 0 || (cap >= map::BASELINE_CAPACITY && cap.is_power_of_two()),
        "capacity {cap} is not on the doubling sequence"
    );

    let mut seen = BTreeSet::new();
    for (key, _) in m.iter() {
        assert!(!key.is_empty(), "live slot with empty key");
        assert!(key.len() <= MAX_KEY_LEN, "live key longer than the buffer");
        assert!(seen.insert(key.to_vec()), "duplicate live key {key:?}");
    }
    assert_eq!(seen.len(), m.len());
}

// Few short keys so that upserts and removals hit existing entries often.
fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'd', 1..=2)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    AddOrAssign(#[proptest(strategy = "key_strategy()")] Vec<u8>, i32),
    AddIfAbsent(#[proptest(strategy = "key_strategy()")] Vec<u8>, i32),
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    Lookup(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(skip)]
    Release,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        95 => any::<Op>(),
        1 => Just(Op::Release),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut m = FixedKeyMap::new();
        let mut model: BTreeMap<Vec<u8>, i32> = BTreeMap::new();

        for op in ops {
            let cap_before = m.capacity();
            let mut released = false;
            match op {
                Op::AddOrAssign(key, value) => {
                    let existed = model.insert(key.clone(), value).is_some();
                    m.add_or_assign(&key, value).unwrap();
                    if existed {
                        prop_assert_eq!(m.capacity(), cap_before);
                    }
                }
                Op::AddIfAbsent(key, value) => {
                    if !model.contains_key(&key) {
                        model.insert(key.clone(), value);
                        m.add_item(&key, value).unwrap();
                    }
                }
                Op::Remove(key) => {
                    prop_assert_eq!(m.remove(&key), model.remove(&key));
                    prop_assert_eq!(m.lookup_value(&key), None);
                    prop_assert_eq!(m.capacity(), cap_before);
                }
                Op::Lookup(key) => {
                    prop_assert_eq!(m.lookup_value(&key), model.get(&key).copied());
                }
                Op::Release => {
                    m.release();
                    model.clear();
                    released = true;
                    prop_assert_eq!(m.capacity(), 0);
                }
            }

            if !released {
                prop_assert!(m.capacity() >= cap_before, "capacity shrank");
            }
            prop_assert_eq!(m.len(), model.len());
            validate_map(&m);
        }

        let got: BTreeMap<Vec<u8>, i32> = m.iter().map(|(k, v)| (k.to_vec(), v)).collect();
        prop_assert_eq!(got, model);
    }

    #[test]
    fn prop_growth_is_smallest_doubling(n in 0usize..300) {
        let mut m = FixedKeyMap::new();
        for i in 0..n {
            m.add_item(format!("k{i}"), i as i32).unwrap();
        }
        let mut expected = 0;
        while expected < n {
            expected = if expected == 0 { map::BASELINE_CAPACITY } else { expected * 2 };
        }
        prop_assert_eq!(m.capacity(), expected);
        prop_assert_eq!(m.len(), n);
    }

    #[test]
    fn prop_tombstone_reused_without_growth(n in 1usize..64, pick in any::<prop::sample::Index>()) {
        let mut m = FixedKeyMap::new();
        for i in 0..n {
            m.add_item(format!("k{i}"), i as i32).unwrap();
        }
        let cap = m.capacity();
        let victim = pick.index(n);
        prop_assert_eq!(m.remove(format!("k{victim}")), Some(victim as i32));
        m.add_or_assign("fresh", -1).unwrap();
        prop_assert_eq!(m.capacity(), cap);
        // Slots before the tombstone are all live, so it is the first free one.
        let idx = m.slots().iter().position(|e| e.matches(b"fresh")).unwrap();
        prop_assert_eq!(idx, victim);
    }

    #[test]
    fn prop_double_remove_is_idempotent(keys in prop::collection::vec(key_strategy(), 1..20), pick in any::<prop::sample::Index>()) {
        let mut m = FixedKeyMap::new();
        for (i, k) in keys.iter().enumerate() {
            m.add_or_assign(k, i as i32).unwrap();
        }
        let key = &keys[pick.index(keys.len())];
        m.remove(key);
        let once: Vec<(Vec<u8>, i32)> = m.iter().map(|(k, v)| (k.to_vec(), v)).collect();
        let cap = m.capacity();
        prop_assert_eq!(m.remove(key), None);
        let twice: Vec<(Vec<u8>, i32)> = m.iter().map(|(k, v)| (k.to_vec(), v)).collect();
        prop_assert_eq!(once, twice);
        prop_assert_eq!(m.capacity(), cap);
    }
}

#[test]
fn seeded_random_churn() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut m = FixedKeyMap::new();
    let mut model: HashMap<String, i32> = HashMap::new();

    for _ in 0..20_000 {
        let key = format!("key:{}", rng.gen_range(0..64));
        if rng.gen_bool(0.6) {
            let value = rng.gen::<i32>();
            m.add_or_assign(&key, value).unwrap();
            model.insert(key, value);
        } else {
            assert_eq!(m.remove(&key), model.remove(&key));
        }
    }

    validate_map(&m);
    assert_eq!(m.len(), model.len());
    for (key, value) in &model {
        assert_eq!(m.lookup_value(key), Some(*value));
    }
    // Never more than 64 distinct keys live at once.
    assert!(m.capacity() <= 64);
}
