#![allow(missing_docs)]

use std::collections::HashSet;

use proptest::prelude::*;
use relcache::storage::{Direction, EdgeIdSet, RelIdArray};
use relcache::types::{EdgeId, TypeId};

const TY: TypeId = TypeId(3);

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Outgoing),
        Just(Direction::Incoming),
        Just(Direction::Both),
    ]
}

fn arb_id() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 0u64..300,
        2 => any::<u64>(),
        1 => prop::sample::select(vec![
            127u64,
            128,
            16_383,
            16_384,
            u64::from(u32::MAX),
            u64::MAX,
        ]),
    ]
}

/// Entries with distinct ids, so membership checks are unambiguous.
fn arb_entries(max: usize) -> impl Strategy<Value = Vec<(u64, Direction)>> {
    prop::collection::vec((arb_id(), arb_direction()), 0..max).prop_map(|entries| {
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|(id, _)| seen.insert(*id))
            .collect()
    })
}

/// Ids each block should hold, in write order.
#[derive(Default)]
struct Model {
    out: Vec<u64>,
    inc: Vec<u64>,
    loops: Vec<u64>,
}

impl Model {
    fn of<'a>(entries: impl IntoIterator<Item = &'a (u64, Direction)>) -> Self {
        let mut model = Self::default();
        for &(id, direction) in entries {
            match direction {
                Direction::Outgoing => model.out.push(id),
                Direction::Incoming => model.inc.push(id),
                Direction::Both => model.loops.push(id),
            }
        }
        model
    }

    fn scan(&self, direction: Direction) -> Vec<u64> {
        let blocks: [&[u64]; 2] = match direction {
            Direction::Outgoing => [&self.out, &[]],
            Direction::Incoming => [&self.inc, &[]],
            Direction::Both => [&self.out, &self.inc],
        };
        blocks
            .into_iter()
            .chain([self.loops.as_slice()])
            .flatten()
            .copied()
            .collect()
    }
}

fn build(entries: &[(u64, Direction)]) -> RelIdArray {
    let mut array = RelIdArray::with_loops(TY);
    for &(id, direction) in entries {
        array.add(EdgeId(id), direction).expect("loop-capable add");
    }
    array
}

fn listed(array: &RelIdArray, direction: Direction) -> Vec<u64> {
    array.iter(direction).map(u64::from).collect()
}

fn assert_matches(array: &RelIdArray, model: &Model) -> Result<(), TestCaseError> {
    for direction in Direction::ALL {
        prop_assert_eq!(
            listed(array, direction),
            model.scan(direction),
            "direction {}",
            direction
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn adds_follow_block_model(entries in arb_entries(200)) {
        let array = build(&entries);
        assert_matches(&array, &Model::of(&entries))?;
    }

    #[test]
    fn shrink_preserves_contents(entries in arb_entries(200)) {
        let array = build(&entries).shrink();
        prop_assert!(array.blocks().all(|(_, block)| block.is_compact()));
        assert_matches(&array, &Model::of(&entries))?;
    }

    #[test]
    fn add_all_is_associative(entries in arb_entries(150), cut_a in 0usize..150, cut_b in 0usize..150) {
        let first = cut_a.min(cut_b).min(entries.len());
        let second = cut_a.max(cut_b).min(entries.len());
        let (a, rest) = entries.split_at(first);
        let (b, c) = rest.split_at(second - first);

        let left = build(a).add_all(&build(b)).add_all(&build(c));
        let right = build(a).add_all(&build(b).add_all(&build(c)));
        let model = Model::of(&entries);
        assert_matches(&left, &model)?;
        assert_matches(&right, &model)?;
    }

    #[test]
    fn remove_all_drops_exactly_the_excluded(
        entries in arb_entries(200),
        mask in prop::collection::vec(any::<bool>(), 200),
    ) {
        let excluded: EdgeIdSet = entries
            .iter()
            .zip(&mask)
            .filter(|(_, drop)| **drop)
            .map(|((id, _), _)| EdgeId(*id))
            .collect();
        let mut array = build(&entries);
        let removed = array.remove_all(&excluded);
        prop_assert_eq!(removed, excluded.len());

        let kept: Vec<_> = entries
            .iter()
            .filter(|(id, _)| !excluded.contains(&EdgeId(*id)))
            .copied()
            .collect();
        assert_matches(&array, &Model::of(&kept))?;
    }

    #[test]
    fn reconcile_appends_and_filters(
        entries in arb_entries(200),
        split in 0usize..200,
        mask in prop::collection::vec(any::<bool>(), 200),
        strangers in prop::collection::vec(any::<u64>(), 0..8),
    ) {
        let (src_entries, add_entries) = entries.split_at(split.min(entries.len()));

        let merged = RelIdArray::reconcile(
            Some(build(src_entries)),
            Some(build(add_entries)),
            None::<&EdgeIdSet>,
        )
        .expect("reconcile")
        .expect("inputs present");
        assert_matches(&merged, &Model::of(&entries))?;

        let mut remove: EdgeIdSet = entries
            .iter()
            .zip(&mask)
            .filter(|(_, drop)| **drop)
            .map(|((id, _), _)| EdgeId(*id))
            .collect();
        remove.extend(strangers.into_iter().map(EdgeId));
        let src = build(src_entries);
        let merged = RelIdArray::reconcile(Some(src.clone()), Some(build(add_entries)), Some(&remove))
            .expect("reconcile")
            .expect("inputs present");
        let kept: Vec<_> = entries
            .iter()
            .filter(|(id, _)| !remove.contains(&EdgeId(*id)))
            .copied()
            .collect();
        assert_matches(&merged, &Model::of(&kept))?;
        assert_matches(&src, &Model::of(src_entries))?;
    }

    #[test]
    fn upgrade_is_idempotent(entries in arb_entries(100)) {
        let directional: Vec<_> = entries
            .iter()
            .filter(|(_, direction)| *direction != Direction::Both)
            .copied()
            .collect();
        let mut plain = RelIdArray::new(TY);
        for &(id, direction) in &directional {
            plain.add(EdgeId(id), direction).expect("directional add");
        }
        let once = plain.clone().into_loop_capable();
        let twice = once.clone().into_loop_capable();
        prop_assert!(once.same_instance(&twice));
        prop_assert!(!once.has_loops());
        let model = Model::of(&directional);
        assert_matches(&plain, &model)?;
        assert_matches(&twice, &model)?;
        prop_assert!(twice.downgrade_if_possible().same_instance(&plain));
    }

    #[test]
    fn another_round_sees_every_id_once(
        entries in arb_entries(150),
        chunks in prop::collection::vec((1usize..12, 0usize..8), 1..24),
    ) {
        let mut array = RelIdArray::with_loops(TY);
        let mut iter = array.iter(Direction::Both);
        let mut seen = Vec::new();
        let mut pending = entries.iter();
        for &(size, take) in chunks.iter().cycle().take(entries.len() + 1) {
            for &(id, direction) in pending.by_ref().take(size) {
                array.add(EdgeId(id), direction).expect("loop-capable add");
            }
            iter.do_another_round(&array);
            seen.extend(iter.by_ref().take(take).map(u64::from));
        }
        for &(id, direction) in pending {
            array.add(EdgeId(id), direction).expect("loop-capable add");
        }
        iter.do_another_round(&array);
        seen.extend(iter.by_ref().map(u64::from));

        let mut expected: Vec<u64> = entries.iter().map(|(id, _)| *id).collect();
        expected.sort_unstable();
        seen.sort_unstable();
        prop_assert_eq!(seen, expected);
    }
}

#[test]
fn round_trips_across_sizes() {
    let thresholds = [0u64, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX];
    for count in [0usize, 1, 1_000] {
        let entries: Vec<(u64, Direction)> = (0..count as u64)
            .map(|i| {
                let id = thresholds[i as usize % thresholds.len()].wrapping_add(i / 7 * 1_000_003);
                (id, Direction::ALL[i as usize % 3])
            })
            .collect();
        let array = build(&entries);
        let model = Model::of(&entries);
        for direction in Direction::ALL {
            assert_eq!(listed(&array, direction), model.scan(direction), "{count} ids, {direction}");
        }
        assert_eq!(array.iter(Direction::Both).count(), count);
    }
}
