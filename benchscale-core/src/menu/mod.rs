// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Static menu description and the stack based navigator that walks it.

mod navigator;
pub mod tree;

pub use navigator::{Activation, Gesture, Navigator, UnwindCursor, MAX_STACK_DEPTH, WINDOW_ROWS};

/// Most items a level can carry, two windows of [`WINDOW_ROWS`].
pub const MAX_LEVEL_ITEMS: usize = 8;

/// What happens when an item is clicked or held. `unwind` is the number of menu levels
/// to pop once the action has finished, counted from the level the action runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuAction {
    NoOp,
    Navigate,
    MemoryStore { slot: u8, unwind: u8 },
    MemoryClear { slot: u8, unwind: u8 },
    ClearAllMemory { unwind: u8 },
    Rezero { unwind: u8 },
    EnterRef { unwind: u8 },
    RunCalibration { unwind: u8 },
    EditCal { unwind: u8 },
    SaveCal { unwind: u8 },
}

/// One row of a menu level.
#[derive(Debug)]
pub struct MenuNode {
    pub label: &'static str,
    pub on_activate: MenuAction,
    pub on_hold: MenuAction,
    /// `None` for leaves, which only run their action.
    pub children: Option<&'static MenuLevel>,
}

impl MenuNode {
    pub const fn leaf(label: &'static str, on_activate: MenuAction, on_hold: MenuAction) -> Self {
        Self {
            label,
            on_activate,
            on_hold,
            children: None,
        }
    }

    pub const fn submenu(label: &'static str, children: &'static MenuLevel) -> Self {
        Self {
            label,
            on_activate: MenuAction::Navigate,
            on_hold: MenuAction::Navigate,
            children: Some(children),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Items sharing one depth. Depth 0 is the weight screen rather than a real menu.
#[derive(Debug)]
pub struct MenuLevel {
    /// Identifies the level, the memory level is drawn with its stored values.
    pub title: &'static str,
    pub depth: u8,
    pub items: &'static [MenuNode],
}

impl MenuLevel {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_memory(&self) -> bool {
        self.title == tree::MEMORY_TITLE
    }
}
