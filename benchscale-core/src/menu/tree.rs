use super::{MenuAction, MenuLevel, MenuNode};

pub const MEMORY_TITLE: &str = "memory";

/// Weight screen. Its single invisible item opens the main menu on click.
pub static ROOT: MenuLevel = MenuLevel {
    title: "weight",
    depth: 0,
    items: &[MenuNode::submenu("", &MAIN_MENU)],
};

pub static MAIN_MENU: MenuLevel = MenuLevel {
    title: "main",
    depth: 1,
    items: &[
        MenuNode::submenu("Memory", &MEMORY_MENU),
        MenuNode::leaf(
            "Clear Mem",
            MenuAction::ClearAllMemory { unwind: 1 },
            MenuAction::NoOp,
        ),
        // zeroing returns straight to the weight screen
        MenuNode::leaf("Re-Zero", MenuAction::Rezero { unwind: 2 }, MenuAction::NoOp),
        MenuNode::submenu("Calibrate", &CALIBRATE_MENU),
    ],
};

const fn memory_slot(label: &'static str, slot: u8) -> MenuNode {
    MenuNode::leaf(
        label,
        MenuAction::MemoryStore { slot, unwind: 1 },
        MenuAction::MemoryClear { slot, unwind: 1 },
    )
}

/// Click stores the current weight, hold clears the slot.
pub static MEMORY_MENU: MenuLevel = MenuLevel {
    title: MEMORY_TITLE,
    depth: 2,
    items: &[
        memory_slot("M0", 0),
        memory_slot("M1", 1),
        memory_slot("M2", 2),
        memory_slot("M3", 3),
        memory_slot("M4", 4),
        memory_slot("M5", 5),
        memory_slot("M6", 6),
        memory_slot("M7", 7),
    ],
};

pub static CALIBRATE_MENU: MenuLevel = MenuLevel {
    title: "calibrate",
    depth: 2,
    items: &[
        MenuNode::leaf("Enter Ref", MenuAction::EnterRef { unwind: 1 }, MenuAction::NoOp),
        MenuNode::leaf(
            "Run Cal",
            MenuAction::RunCalibration { unwind: 1 },
            MenuAction::NoOp,
        ),
        MenuNode::leaf("Edit Cal", MenuAction::EditCal { unwind: 1 }, MenuAction::NoOp),
        MenuNode::leaf("Save Cal", MenuAction::SaveCal { unwind: 1 }, MenuAction::NoOp),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MAX_LEVEL_ITEMS;
    use crate::storage::MEMORY_SLOT_COUNT;

    fn levels() -> [&'static MenuLevel; 4] {
        [&ROOT, &MAIN_MENU, &MEMORY_MENU, &CALIBRATE_MENU]
    }

    #[test]
    fn no_level_exceeds_two_windows() {
        for level in levels() {
            assert!(!level.is_empty());
            assert!(level.len() <= MAX_LEVEL_ITEMS, "{}", level.title);
        }
    }

    #[test]
    fn children_sit_one_level_deeper() {
        for level in levels() {
            for item in level.items {
                if let Some(child) = item.children {
                    assert_eq!(child.depth, level.depth + 1);
                    assert_eq!(item.on_activate, MenuAction::Navigate);
                }
            }
        }
    }

    #[test]
    fn memory_level_covers_every_slot() {
        assert!(MEMORY_MENU.is_memory());
        assert_eq!(MEMORY_MENU.len(), MEMORY_SLOT_COUNT);
        for (i, item) in MEMORY_MENU.items.iter().enumerate() {
            assert_eq!(
                item.on_activate,
                MenuAction::MemoryStore { slot: i as u8, unwind: 1 }
            );
            assert_eq!(
                item.on_hold,
                MenuAction::MemoryClear { slot: i as u8, unwind: 1 }
            );
        }
    }

    #[test]
    fn only_rezero_unwinds_two_levels() {
        for level in levels() {
            for item in level.items {
                match item.on_activate {
                    MenuAction::Rezero { unwind } => assert_eq!(unwind, 2),
                    MenuAction::MemoryStore { unwind, .. }
                    | MenuAction::ClearAllMemory { unwind }
                    | MenuAction::EnterRef { unwind }
                    | MenuAction::RunCalibration { unwind }
                    | MenuAction::EditCal { unwind }
                    | MenuAction::SaveCal { unwind } => assert_eq!(unwind, 1),
                    _ => {}
                }
            }
        }
    }
}
