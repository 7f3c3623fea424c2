//! End-to-end scenarios driving the tree through its public surface: the
//! classic rotation workloads, cursor walks, and a randomized comparison
//! against `BTreeMap`.

use rand::prelude::*;
use std::collections::BTreeMap;

use ttree::{CursorState, Ttree};

fn assert_content(tree: &Ttree<u32>, expect: impl IntoIterator<Item = u32>) {
    let got: Vec<u32> = tree.iter().copied().collect();
    let want: Vec<u32> = expect.into_iter().collect();
    assert_eq!(got, want);
}

#[test]
fn ascending_run_single_right_rotations() {
    let mut tree = Ttree::new(4, true).unwrap();
    for k in 1..=16u32 {
        tree.insert(k).unwrap();
        tree.dbg_check();
    }
    assert_eq!(tree.len(), 16);
    assert!(tree.depth() <= 4, "depth {} for 16 keys", tree.depth());
    assert_content(&tree, 1..=16);
}

#[test]
fn descending_run_single_left_rotations() {
    let mut tree = Ttree::new(4, true).unwrap();
    for k in (1..=16u32).rev() {
        tree.insert(k).unwrap();
        tree.dbg_check();
    }
    assert_eq!(tree.len(), 16);
    assert!(tree.depth() <= 4, "depth {} for 16 keys", tree.depth());
    assert_content(&tree, 1..=16);
}

#[test]
fn double_rotations_both_directions() {
    // Two ascending runs and two descending runs arranged so the tree has
    // to perform left-right and right-left double rotations, with a
    // deletion in the middle to skew the donor side.
    let n = 4u32;
    let middle = 100_000u32;
    let mut tree = Ttree::new(4, true).unwrap();

    for i in 0..n {
        tree.insert(middle + i).unwrap();
        tree.dbg_check();
    }
    for i in 0..n {
        tree.insert(middle / 2 - i - 1).unwrap();
        tree.dbg_check();
    }

    // Drop the global maximum so the future left child outweighs the right
    // one, steering the post-rotation refill to come from the left.
    let max = middle + n - 1;
    assert_eq!(tree.remove(&max), Some(max));
    tree.dbg_check();

    for i in 0..n {
        tree.insert(middle / 2 + i).unwrap();
        tree.dbg_check();
    }
    for i in 0..n {
        tree.insert(middle * 2 + i).unwrap();
        tree.dbg_check();
    }
    for i in 0..n {
        tree.insert(middle * 2 - i - 1).unwrap();
        tree.dbg_check();
    }

    let mut expect: Vec<u32> = Vec::new();
    expect.extend((0..n).map(|i| middle / 2 - i - 1));
    expect.extend((0..n).map(|i| middle / 2 + i));
    expect.extend((0..n - 1).map(|i| middle + i));
    expect.extend((0..n).map(|i| middle * 2 - i - 1));
    expect.extend((0..n).map(|i| middle * 2 + i));
    expect.sort_unstable();
    assert_content(&tree, expect);
}

#[test]
fn mixed_fill_then_drain_through_the_root() {
    // Fill two disjoint ranges with per-step checks, then repeatedly delete
    // the smallest and greatest keys until nothing is left. Deleting at the
    // extremes keeps pulling keys out of interior nodes, which exercises
    // the borrow-from-successor and half-leaf merge paths.
    let mut tree = Ttree::new(4, true).unwrap();
    let mut keys: Vec<u32> = Vec::new();
    for k in (0..400u32).chain(1000..1400) {
        tree.insert(k).unwrap();
        tree.dbg_check();
        keys.push(k);
    }

    let mut lo = 0usize;
    let mut hi = keys.len() - 1;
    let mut take_low = true;
    while lo <= hi {
        let k = if take_low { keys[lo] } else { keys[hi] };
        assert_eq!(tree.remove(&k), Some(k), "failed deleting {k}");
        tree.dbg_check();
        if take_low {
            lo += 1;
        } else {
            if hi == 0 {
                break;
            }
            hi -= 1;
        }
        take_low = !take_low;
    }
    assert!(tree.is_empty());
    assert_eq!(tree.depth(), 0);
}

#[test]
fn cursor_full_sweeps() {
    let n = 1000u32;
    let mut tree = Ttree::new(4, true).unwrap();
    for k in 1..=n {
        tree.insert(k).unwrap();
    }

    let mut cursor = tree.cursor_first();
    let mut forward = vec![*tree.item_at(&cursor).unwrap()];
    while let Some(&k) = tree.cursor_next(&mut cursor) {
        forward.push(k);
    }
    assert_eq!(forward, (1..=n).collect::<Vec<_>>());

    let mut cursor = tree.cursor_last();
    let mut backward = vec![*tree.item_at(&cursor).unwrap()];
    while let Some(&k) = tree.cursor_prev(&mut cursor) {
        backward.push(k);
    }
    assert_eq!(backward, (1..=n).rev().collect::<Vec<_>>());
}

#[test]
fn pending_cursor_navigation() {
    // A single node holding 1..=M-1: a missed lookup above the window
    // steps back onto M-1, a missed lookup below it steps forward onto 1.
    let m = 4u32;
    let mut tree = Ttree::new(m as usize, true).unwrap();
    for k in 1..m {
        tree.insert(k).unwrap();
    }

    let mut cursor = tree.seek(&m);
    assert_eq!(cursor.state(), CursorState::Pending);
    assert_eq!(tree.cursor_prev(&mut cursor), Some(&(m - 1)));
    assert_eq!(cursor.state(), CursorState::Opened);

    let mut cursor = tree.seek(&0);
    assert_eq!(cursor.state(), CursorState::Pending);
    assert_eq!(tree.cursor_next(&mut cursor), Some(&1));
    assert_eq!(cursor.state(), CursorState::Opened);
}

#[test]
fn placed_insert_matches_plain_insert() {
    // A miss cursor fed back into insert_at must build the same tree a
    // plain insert would.
    let mut rng = SmallRng::seed_from_u64(17);
    let keys: Vec<u32> = (0..300).map(|_| rng.gen_range(0..100_000)).collect();

    let mut plain = Ttree::new(4, true).unwrap();
    let mut placed = Ttree::new(4, true).unwrap();
    for &k in &keys {
        let _ = plain.insert(k);

        let mut cursor = placed.seek(&k);
        if cursor.state() != CursorState::Opened {
            placed.insert_at(&mut cursor, k);
            assert_eq!(placed.key_at(&cursor), Some(&k));
        }
    }

    plain.dbg_check();
    placed.dbg_check();
    assert_eq!(plain.len(), placed.len());
    assert_eq!(plain.depth(), placed.depth());
    assert!(plain.iter().eq(placed.iter()));
}

#[test]
fn insert_then_remove_round_trip() {
    let mut tree = Ttree::new(4, true).unwrap();
    for k in (10..500u32).step_by(3) {
        tree.insert(k).unwrap();
    }
    let before: Vec<u32> = tree.iter().copied().collect();
    let depth_before = tree.depth();

    for probe in [0u32, 11, 250, 600] {
        tree.insert(probe).unwrap();
        assert_eq!(tree.remove(&probe), Some(probe));
        tree.dbg_check();
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), before);
        assert_eq!(tree.depth(), depth_before);
    }
}

#[test]
fn replace_keeps_the_shape() {
    let mut tree: Ttree<(u32, u32)> = Ttree::new(8, true).unwrap();
    for k in 0..200u32 {
        tree.insert((k, 0)).unwrap();
    }
    let depth = tree.depth();

    for k in 0..200u32 {
        assert_eq!(tree.replace((k, k + 1)), Ok((k, 0)));
    }
    assert!(tree.replace((999, 1)).is_err());

    tree.dbg_check();
    assert_eq!(tree.depth(), depth);
    assert!(tree.iter().all(|&(k, v)| v == k + 1));
}

#[test]
fn randomized_mixed_workload() {
    let mut rng = SmallRng::seed_from_u64(0xdecafbad);
    for &m in &[2usize, 4, 8] {
        let mut tree: Ttree<u32> = Ttree::new(m, true).unwrap();
        let mut oracle: BTreeMap<u32, ()> = BTreeMap::new();

        for step in 0..3000 {
            let k = rng.gen_range(0..400);
            match rng.gen_range(0..10) {
                0..=4 => {
                    let fresh = oracle.insert(k, ()).is_none();
                    assert_eq!(tree.insert(k).is_ok(), fresh, "insert {k} (m={m})");
                }
                5..=7 => {
                    assert_eq!(tree.remove(&k).is_some(), oracle.remove(&k).is_some());
                }
                8 => {
                    assert_eq!(tree.get(&k).is_some(), oracle.contains_key(&k));
                }
                _ => {
                    // Walk a few steps from wherever k would be.
                    let mut cursor = tree.seek(&k);
                    let mut walked = Vec::new();
                    for _ in 0..5 {
                        match tree.cursor_next(&mut cursor) {
                            Some(&key) => walked.push(key),
                            None => break,
                        }
                    }
                    for pair in walked.windows(2) {
                        assert!(pair[0] < pair[1]);
                    }
                }
            }

            assert_eq!(tree.len(), oracle.len());
            if step % 100 == 0 {
                tree.dbg_check();
                assert!(tree.iter().copied().eq(oracle.keys().copied()));
            }
        }
        tree.dbg_check();
        assert!(tree.iter().copied().eq(oracle.keys().copied()));
    }
}

#[test]
fn non_unique_tree_keeps_equal_keys_adjacent() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut tree: Ttree<(u8, u32)> = Ttree::new(4, false).unwrap();
    let mut oracle: Vec<u8> = Vec::new();

    for seq in 0..600u32 {
        let k = rng.gen_range(0..20u8);
        tree.insert((k, seq)).unwrap();
        oracle.push(k);
        if seq % 50 == 0 {
            tree.dbg_check();
        }
    }
    oracle.sort_unstable();
    tree.dbg_check();

    let keys: Vec<u8> = tree.iter().map(|&(k, _)| k).collect();
    assert_eq!(keys, oracle);

    // Draining by key removes one equal item at a time.
    let mut left = oracle.len();
    while let Some(&(k, _)) = tree.iter().next() {
        assert!(tree.remove(&k).is_some());
        left -= 1;
        assert_eq!(tree.len(), left);
        if left % 64 == 0 {
            tree.dbg_check();
        }
    }
    assert!(tree.is_empty());
}

#[test]
fn clear_and_reuse() {
    let mut tree = Ttree::new(4, true).unwrap();
    for k in 0..100u32 {
        tree.insert(k).unwrap();
    }
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.iter().next(), None);
    assert_eq!(tree.get(&5), None);

    for k in 0..100u32 {
        tree.insert(k).unwrap();
    }
    tree.dbg_check();
    assert_eq!(tree.len(), 100);
}
