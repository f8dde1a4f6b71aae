//! Property-based invariant tests for the tilegrid placement engine.
//!
//! These tests verify structural invariants that must hold for **any**
//! sequence of placements on a small grid:
//!
//! 1. No two positioned items overlap after any placement.
//! 2. Every positioned item lies inside the grid bounds.
//! 3. Re-placing an item at its own position changes nothing.
//! 4. Auto-placement is deterministic.
//! 5. Float-up compacts in one pass (a second pass is a no-op).
//! 6. The recomputed height covers every item and respects the row bounds.
//! 7. Pushing a column group keeps the offsets between its items.
//! 8. Mixed place/auto-place/remove/float sequences keep 1-2 and keep every
//!    item's origin cell in the occupancy map, in dense and sparse mode.

use proptest::prelude::*;
use tilegrid_layout::{Cell, GridConfig, GridItem, ItemId, PlacementEngine, Region};

// ── Helpers ─────────────────────────────────────────────────────────────

const COLUMNS: usize = 6;
const MAX_ROWS: usize = 100;

#[derive(Debug, Clone, Copy)]
struct Target {
    size_x: usize,
    size_y: usize,
    row: usize,
    col: usize,
}

fn target_strategy() -> impl Strategy<Value = Target> {
    (1usize..=3, 1usize..=3, 0usize..20, 0usize..COLUMNS).prop_map(|(size_x, size_y, row, col)| Target {
        size_x,
        size_y,
        row,
        col,
    })
}

fn targets(max_len: usize) -> impl Strategy<Value = Vec<Target>> {
    proptest::collection::vec(target_strategy(), 1..=max_len)
}

fn config() -> GridConfig {
    GridConfig::default().with_columns(COLUMNS).with_rows(1, MAX_ROWS)
}

fn engine() -> PlacementEngine {
    PlacementEngine::from_config(&config())
}

fn build(drops: &[Target], loaded: bool) -> (PlacementEngine, Vec<ItemId>) {
    let mut e = engine();
    e.set_loaded(loaded);
    let mut ids = Vec::with_capacity(drops.len());
    for d in drops {
        let id = e.insert(GridItem::new(d.size_x, d.size_y));
        e.place(id, Some(Cell::new(d.row, d.col))).expect("placement");
        ids.push(id);
    }
    (e, ids)
}

fn regions(e: &PlacementEngine, ids: &[ItemId]) -> Vec<Option<Region>> {
    ids.iter().map(|&id| e.model().region_of(id)).collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. No overlap, in bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn placements_never_overlap(drops in targets(12), loaded in any::<bool>()) {
        let (e, ids) = build(&drops, loaded);
        prop_assert_eq!(e.model().first_overlap(), None);
        for region in regions(&e, &ids) {
            let region = region.expect("every item is positioned");
            prop_assert!(region.right() <= COLUMNS, "{:?} exceeds columns", region);
            prop_assert!(region.bottom() <= MAX_ROWS, "{:?} exceeds rows", region);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Idempotent placement
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn replacing_in_place_is_a_no_op(drops in targets(10), pick in any::<prop::sample::Index>()) {
        let (mut e, ids) = build(&drops, false);
        let id = ids[pick.index(ids.len())];
        let before = regions(&e, &ids);
        let origin = e.model().get(id).and_then(GridItem::origin);
        e.place(id, origin).expect("placement");
        prop_assert_eq!(before, regions(&e, &ids));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Auto-placement determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn auto_placement_is_deterministic(sizes in proptest::collection::vec((1usize..=3, 1usize..=3), 1..=12)) {
        let run = || {
            let mut e = engine();
            sizes
                .iter()
                .map(|&(sx, sy)| {
                    let id = e.insert(GridItem::new(sx, sy));
                    e.auto_place(id).expect("free cell")
                })
                .collect::<Vec<_>>()
        };
        let first = run();
        prop_assert_eq!(&first, &run());
        prop_assert!(first.iter().all(|cell| cell.col < COLUMNS));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Float convergence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn float_converges_in_one_pass(drops in targets(12)) {
        let (mut e, ids) = build(&drops, false);
        e.float_all_up().expect("float");
        let once = regions(&e, &ids);
        e.float_all_up().expect("float");
        prop_assert_eq!(&once, &regions(&e, &ids));
        prop_assert_eq!(e.model().first_overlap(), None);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Height bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn height_covers_items_within_bounds(drops in targets(12), delta in 0isize..=4) {
        let (mut e, ids) = build(&drops, false);
        let height = e.update_height(delta, None);
        let lowest = regions(&e, &ids)
            .into_iter()
            .flatten()
            .map(|r| r.bottom())
            .max()
            .unwrap_or(0);
        prop_assert!(height >= e.min_rows());
        prop_assert!(height <= MAX_ROWS);
        prop_assert_eq!(height, (lowest + delta as usize).clamp(e.min_rows(), MAX_ROWS));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Column group offsets survive a push
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pushed_column_keeps_offsets(gaps in proptest::collection::vec(0usize..3, 1..=5), target in 0usize..10) {
        let mut e = engine();
        let mut ids = Vec::new();
        let mut row = 0;
        for gap in gaps {
            row += gap;
            let id = e.insert(GridItem::new(1, 1));
            e.place(id, Some(Cell::new(row, 0))).expect("placement");
            ids.push(id);
            row += 1;
        }
        let rows = |e: &PlacementEngine| -> Vec<usize> {
            ids.iter().filter_map(|&id| e.model().region_of(id)).map(|r| r.row).collect()
        };
        let before = rows(&e);
        e.move_items_down(&ids, before[0] + target, &[]).expect("push");
        let after = rows(&e);
        let shift = after[0] - before[0];
        prop_assert_eq!(shift, target);
        for (b, a) in before.iter().zip(&after) {
            prop_assert_eq!(a - b, shift);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Mixed operation sequences
// ═════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
enum Op {
    Place(Target),
    AutoPlace(usize, usize),
    Move(prop::sample::Index, usize, usize),
    Remove(prop::sample::Index),
    FloatAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => target_strategy().prop_map(Op::Place),
        2 => (1usize..=3, 1usize..=3).prop_map(|(sx, sy)| Op::AutoPlace(sx, sy)),
        3 => (any::<prop::sample::Index>(), 0usize..20, 0usize..COLUMNS)
            .prop_map(|(pick, row, col)| Op::Move(pick, row, col)),
        1 => any::<prop::sample::Index>().prop_map(Op::Remove),
        1 => Just(Op::FloatAll),
    ]
}

fn check_consistent(e: &PlacementEngine, ids: &[ItemId]) -> Result<(), TestCaseError> {
    prop_assert_eq!(e.model().first_overlap(), None);
    for &id in ids {
        let item = e.model().get(id).expect("live item");
        let origin = item.origin().expect("positioned");
        prop_assert_eq!(item.committed(), Some(origin));
        prop_assert!(e.model().cell_holds(origin, id), "{} lost its cell", id);
        let region = e.model().region_of(id).expect("region");
        prop_assert!(region.right() <= COLUMNS, "{:?} exceeds columns", region);
        prop_assert!(region.bottom() <= MAX_ROWS, "{:?} exceeds rows", region);
    }
    Ok(())
}

proptest! {
    #[test]
    fn mixed_operations_keep_the_grid_consistent(
        ops in proptest::collection::vec(op_strategy(), 1..=24),
        sparse in any::<bool>(),
        loaded in any::<bool>(),
    ) {
        let mut e = PlacementEngine::from_config(&config().with_sparse(sparse));
        e.set_loaded(loaded);
        let mut ids: Vec<ItemId> = Vec::new();
        for op in ops {
            match op {
                Op::Place(t) => {
                    let id = e.insert(GridItem::new(t.size_x, t.size_y));
                    e.place(id, Some(Cell::new(t.row, t.col))).expect("placement");
                    ids.push(id);
                }
                Op::AutoPlace(sx, sy) => {
                    let id = e.insert(GridItem::new(sx, sy));
                    e.auto_place(id).expect("free cell");
                    ids.push(id);
                }
                Op::Move(pick, row, col) if !ids.is_empty() => {
                    let id = ids[pick.index(ids.len())];
                    e.place(id, Some(Cell::new(row, col))).expect("move");
                }
                Op::Remove(pick) if !ids.is_empty() => {
                    let id = ids.remove(pick.index(ids.len()));
                    e.remove(id).expect("remove");
                }
                Op::FloatAll => e.float_all_up().expect("float"),
                Op::Move(..) | Op::Remove(_) => {}
            }
            check_consistent(&e, &ids)?;
        }
    }
}
