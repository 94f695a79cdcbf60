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

use super::{MenuAction, MenuLevel};
use crate::error::NavigationError;
use crate::input::Direction;
use core::ops::Range;
use heapless::Vec;

/// Stack capacity, the root plus four nested levels.
pub const MAX_STACK_DEPTH: usize = 5;
/// Rows the display can show at once.
pub const WINDOW_ROWS: usize = 4;

#[derive(Debug, Clone, Copy)]
enum FrameKind {
    Level(&'static MenuLevel),
    /// Pushed for a leaf while its action runs.
    Leaf,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    /// Cursor of the parent level when this frame was pushed.
    return_cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    Click,
    Hold,
}

/// Where the cursor lands after an action unwinds the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnwindCursor {
    Restore,
    Reset,
}

/// Result of activating an item. The action still has to be run by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Activation {
    pub action: MenuAction,
    pub label: &'static str,
}

/// Menu stack, cursor and redraw flag.
///
/// `stack[0]` is always the root level and the depth is `stack.len() - 1`.
pub struct Navigator {
    stack: Vec<Frame, MAX_STACK_DEPTH>,
    cursor: usize,
    redraw_needed: bool,
    hold_latched: bool,
}

impl Navigator {
    pub fn new(root: &'static MenuLevel) -> Self {
        let mut stack = Vec::new();
        // capacity is non-zero
        let _ = stack.push(Frame {
            kind: FrameKind::Level(root),
            return_cursor: 0,
        });
        Self {
            stack,
            cursor: 0,
            redraw_needed: true,
            hold_latched: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Level on top of the stack, `None` while a leaf action owns the screen.
    pub fn current_level(&self) -> Option<&'static MenuLevel> {
        match self.stack.last().map(|frame| frame.kind) {
            Some(FrameKind::Level(level)) => Some(level),
            _ => None,
        }
    }

    fn item_count(&self) -> usize {
        self.current_level().map_or(0, MenuLevel::len)
    }

    pub fn rotate(&mut self, direction: Direction) {
        let count = self.item_count();
        if self.depth() == 0 || count == 0 {
            return;
        }
        self.clamp_cursor();
        self.cursor = match direction {
            Direction::Clockwise => (self.cursor + 1) % count,
            Direction::CounterClockwise if self.cursor == 0 => count - 1,
            Direction::CounterClockwise => self.cursor - 1,
        };
        self.redraw_needed = true;
    }

    /// Push the highlighted item's child, or a leaf frame, and hand back the action to run.
    ///
    /// A hold only counts once until [`Navigator::release`] is called. Leaves without an
    /// action for the gesture are ignored.
    pub fn activate(&mut self, gesture: Gesture) -> Result<Option<Activation>, NavigationError> {
        match gesture {
            Gesture::Hold if self.hold_latched => return Ok(None),
            Gesture::Hold => self.hold_latched = true,
            Gesture::Click => self.hold_latched = false,
        }

        let Some(level) = self.current_level() else {
            return Ok(None);
        };
        self.clamp_cursor();
        let Some(item) = level.items.get(self.cursor) else {
            return Ok(None);
        };

        let action = match gesture {
            Gesture::Click => item.on_activate,
            Gesture::Hold => item.on_hold,
        };
        if item.is_leaf() && action == MenuAction::NoOp {
            return Ok(None);
        }

        let kind = match item.children {
            Some(child) => FrameKind::Level(child),
            None => FrameKind::Leaf,
        };
        self.stack
            .push(Frame {
                kind,
                return_cursor: self.cursor,
            })
            .map_err(|_| {
                warn!("Menu stack full at depth {}", self.depth());
                NavigationError::DepthExceeded
            })?;

        trace!("Entered '{}', depth {}", item.label, self.depth());
        self.cursor = 0;
        self.redraw_needed = true;
        Ok(Some(Activation {
            action,
            label: item.label,
        }))
    }

    pub fn release(&mut self) {
        self.hold_latched = false;
    }

    /// Go up one level with the cursor on the first item. Nothing happens at the root.
    pub fn back(&mut self) -> bool {
        if self.depth() == 0 {
            return false;
        }
        self.stack.pop();
        self.cursor = 0;
        self.redraw_needed = true;
        trace!("Back to depth {}", self.depth());
        true
    }

    /// Pop `levels` frames after an action finished. The root is never popped.
    pub fn unwind(&mut self, levels: u8, cursor: UnwindCursor) {
        let mut return_cursor = self.cursor;
        for _ in 0..levels {
            if self.depth() == 0 {
                break;
            }
            if let Some(frame) = self.stack.pop() {
                return_cursor = frame.return_cursor;
            }
        }
        self.cursor = match cursor {
            UnwindCursor::Restore => return_cursor,
            UnwindCursor::Reset => 0,
        };
        self.clamp_cursor();
        self.redraw_needed = true;
        trace!("Unwound to depth {}, cursor {}", self.depth(), self.cursor);
    }

    pub fn clamp_cursor(&mut self) {
        let count = self.item_count();
        if count == 0 {
            self.cursor = 0;
        } else if self.cursor >= count {
            self.cursor = count - 1;
        }
    }

    /// Rows to draw. Either the first window of four or everything after it, nothing in
    /// between.
    pub fn visible_window(&self) -> Range<usize> {
        let count = self.item_count();
        if self.cursor >= WINDOW_ROWS {
            WINDOW_ROWS..count
        } else {
            0..count.min(WINDOW_ROWS)
        }
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw_needed
    }

    pub fn request_redraw(&mut self) {
        self.redraw_needed = true;
    }

    pub fn redraw_done(&mut self) {
        self.redraw_needed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::tree::{CALIBRATE_MENU, MAIN_MENU, MEMORY_MENU, ROOT};
    use crate::menu::MenuNode;

    fn at_memory_menu() -> Navigator {
        let mut nav = Navigator::new(&ROOT);
        nav.activate(Gesture::Click).unwrap();
        nav.activate(Gesture::Click).unwrap();
        nav
    }

    #[test]
    fn rotation_is_ignored_on_the_weight_screen() {
        let mut nav = Navigator::new(&ROOT);
        nav.redraw_done();
        nav.rotate(Direction::Clockwise);
        assert_eq!(nav.cursor(), 0);
        assert!(!nav.needs_redraw());
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let mut nav = at_memory_menu();
        assert_eq!(nav.current_level().unwrap().title, MEMORY_MENU.title);

        nav.rotate(Direction::CounterClockwise);
        assert_eq!(nav.cursor(), 7);
        nav.rotate(Direction::Clockwise);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn submenu_click_pushes_child_and_resets_cursor() {
        let mut nav = Navigator::new(&ROOT);
        let activation = nav.activate(Gesture::Click).unwrap().unwrap();
        assert_eq!(activation.action, MenuAction::Navigate);
        assert_eq!(nav.depth(), 1);

        nav.rotate(Direction::Clockwise);
        nav.rotate(Direction::Clockwise);
        nav.rotate(Direction::Clockwise);
        nav.activate(Gesture::Click).unwrap();
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.current_level().unwrap().title, CALIBRATE_MENU.title);
    }

    #[test]
    fn leaf_click_pushes_a_leaf_frame() {
        let mut nav = at_memory_menu();
        nav.rotate(Direction::Clockwise);
        let activation = nav.activate(Gesture::Click).unwrap().unwrap();
        assert_eq!(
            activation.action,
            MenuAction::MemoryStore { slot: 1, unwind: 1 }
        );
        assert_eq!(nav.depth(), 3);
        assert!(nav.current_level().is_none());

        // nothing to activate while the leaf owns the screen
        assert_eq!(nav.activate(Gesture::Click), Ok(None));
    }

    #[test]
    fn hold_fires_once_until_release() {
        let mut nav = at_memory_menu();
        let first = nav.activate(Gesture::Hold).unwrap().unwrap();
        assert_eq!(first.action, MenuAction::MemoryClear { slot: 0, unwind: 1 });
        nav.unwind(1, UnwindCursor::Restore);

        assert_eq!(nav.activate(Gesture::Hold), Ok(None));
        nav.release();
        assert!(nav.activate(Gesture::Hold).unwrap().is_some());
    }

    #[test]
    fn hold_on_leaf_without_hold_action_is_ignored() {
        let mut nav = Navigator::new(&ROOT);
        nav.activate(Gesture::Click).unwrap();
        nav.rotate(Direction::Clockwise);
        assert_eq!(nav.activate(Gesture::Hold), Ok(None));
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn double_click_at_root_changes_nothing() {
        let mut nav = Navigator::new(&ROOT);
        assert!(!nav.back());
        assert_eq!(nav.depth(), 0);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn back_pops_and_resets_cursor() {
        let mut nav = at_memory_menu();
        nav.rotate(Direction::Clockwise);
        assert!(nav.back());
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.current_level().unwrap().title, MAIN_MENU.title);
    }

    #[test]
    fn unwind_restores_or_resets_the_parent_cursor() {
        let mut nav = at_memory_menu();
        for _ in 0..5 {
            nav.rotate(Direction::Clockwise);
        }
        nav.activate(Gesture::Click).unwrap();
        nav.unwind(1, UnwindCursor::Restore);
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.cursor(), 5);

        let mut nav = Navigator::new(&ROOT);
        nav.activate(Gesture::Click).unwrap();
        nav.rotate(Direction::Clockwise);
        nav.rotate(Direction::Clockwise);
        nav.activate(Gesture::Click).unwrap();
        nav.unwind(2, UnwindCursor::Reset);
        assert_eq!(nav.depth(), 0);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn unwind_never_pops_the_root() {
        let mut nav = Navigator::new(&ROOT);
        nav.activate(Gesture::Click).unwrap();
        nav.unwind(4, UnwindCursor::Restore);
        assert_eq!(nav.depth(), 0);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn window_switches_between_two_fixed_pages() {
        let mut nav = at_memory_menu();
        for expected_cursor in 0..8 {
            let window = nav.visible_window();
            if expected_cursor < 4 {
                assert_eq!(window, 0..4);
            } else {
                assert_eq!(window, 4..8);
            }
            nav.rotate(Direction::Clockwise);
        }
    }

    static DEEP_5: MenuLevel = MenuLevel {
        title: "d5",
        depth: 5,
        items: &[MenuNode::leaf("x", MenuAction::SaveCal { unwind: 1 }, MenuAction::NoOp)],
    };
    static DEEP_4: MenuLevel = MenuLevel {
        title: "d4",
        depth: 4,
        items: &[MenuNode::submenu("d5", &DEEP_5)],
    };
    static DEEP_3: MenuLevel = MenuLevel {
        title: "d3",
        depth: 3,
        items: &[MenuNode::submenu("d4", &DEEP_4)],
    };
    static DEEP_2: MenuLevel = MenuLevel {
        title: "d2",
        depth: 2,
        items: &[MenuNode::submenu("d3", &DEEP_3)],
    };
    static DEEP_1: MenuLevel = MenuLevel {
        title: "d1",
        depth: 1,
        items: &[MenuNode::submenu("d2", &DEEP_2)],
    };
    static DEEP_ROOT: MenuLevel = MenuLevel {
        title: "d0",
        depth: 0,
        items: &[MenuNode::submenu("d1", &DEEP_1)],
    };

    #[test]
    fn pushing_past_the_stack_bound_is_an_error() {
        let mut nav = Navigator::new(&DEEP_ROOT);
        for _ in 0..4 {
            assert!(nav.activate(Gesture::Click).unwrap().is_some());
        }
        assert_eq!(nav.depth(), 4);
        assert_eq!(
            nav.activate(Gesture::Click),
            Err(NavigationError::DepthExceeded)
        );
        assert_eq!(nav.depth(), 4);
        assert_eq!(nav.current_level().unwrap().title, "d4");
    }
}
