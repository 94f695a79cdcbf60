use benchscale_core::input::RotaryAccumulator;
use benchscale_core::load_cell::LoadCell;
use benchscale_core::measurement::TareMode;
use benchscale_core::menu::{tree, Gesture, Navigator, MAX_STACK_DEPTH, WINDOW_ROWS};
use benchscale_core::{Direction, MeasurementSource};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Turn(bool),
    Click,
    Hold,
    Release,
    Back,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Turn),
        Just(Op::Click),
        Just(Op::Hold),
        Just(Op::Release),
        Just(Op::Back),
    ]
}

fn direction(forward: bool) -> Direction {
    if forward {
        Direction::Clockwise
    } else {
        Direction::CounterClockwise
    }
}

fn memory_navigator() -> Navigator {
    let mut nav = Navigator::new(&tree::ROOT);
    nav.activate(Gesture::Click).unwrap();
    nav.activate(Gesture::Click).unwrap();
    nav
}

proptest! {
    #[test]
    fn cursor_follows_turns_modulo_level_length(turns in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut nav = memory_navigator();
        let len = tree::MEMORY_MENU.len() as i64;
        let mut expected = 0i64;

        for forward in turns {
            nav.rotate(direction(forward));
            expected = (expected + if forward { 1 } else { -1 }).rem_euclid(len);
            prop_assert_eq!(nav.cursor() as i64, expected);
        }
    }

    #[test]
    fn full_turn_returns_to_start(start in 0usize..8) {
        let mut nav = memory_navigator();
        for _ in 0..start {
            nav.rotate(Direction::Clockwise);
        }
        for _ in 0..tree::MEMORY_MENU.len() {
            nav.rotate(Direction::Clockwise);
        }
        prop_assert_eq!(nav.cursor(), start);
    }

    #[test]
    fn window_is_one_of_two_pages_and_holds_cursor(steps in 0usize..32) {
        let mut nav = memory_navigator();
        for _ in 0..steps {
            nav.rotate(Direction::Clockwise);
        }
        let window = nav.visible_window();
        prop_assert!(window == (0..WINDOW_ROWS) || window == (WINDOW_ROWS..8));
        prop_assert!(window.contains(&nav.cursor()));
    }

    #[test]
    fn navigation_never_leaves_the_stack_bounds(ops in proptest::collection::vec(op(), 0..128)) {
        let mut nav = Navigator::new(&tree::ROOT);
        for op in ops {
            match op {
                Op::Turn(forward) => nav.rotate(direction(forward)),
                Op::Click => { let _ = nav.activate(Gesture::Click); }
                Op::Hold => { let _ = nav.activate(Gesture::Hold); }
                Op::Release => nav.release(),
                Op::Back => { nav.back(); }
            }
            prop_assert!(nav.depth() < MAX_STACK_DEPTH);
            if let Some(level) = nav.current_level() {
                prop_assert!(nav.cursor() < level.len());
                prop_assert_eq!(level.depth as usize, nav.depth());
            }
        }
    }

    #[test]
    fn accumulator_reports_direction_of_change(deltas in proptest::collection::vec(-5i32..=5, 1..32)) {
        let mut acc = RotaryAccumulator::new();
        for delta in deltas {
            let expected = match delta.signum() {
                0 => None,
                1 => Some(Direction::Clockwise),
                _ => Some(Direction::CounterClockwise),
            };
            prop_assert_eq!(acc.update(delta), expected);
        }
    }

    #[test]
    fn calibration_constant_maps_reference_back(
        offset in -100_000i32..100_000,
        counts_per_unit in 50.0f32..5_000.0,
        reference in 0.1f32..20.0,
    ) {
        let mut cell = LoadCell::<4>::new(1.0);
        for _ in 0..4 {
            cell.push_raw(offset);
        }
        cell.tare(TareMode::Blocking);

        let tared = (counts_per_unit * reference).round() as i32;
        cell.refresh_data_set();
        for _ in 0..4 {
            cell.push_raw(offset + tared);
        }
        let constant = cell.compute_calibration_from_reference(reference).unwrap();

        let measured = tared as f32 * (1.0 / constant);
        prop_assert!((measured - reference).abs() <= reference * 1e-3);
    }
}
