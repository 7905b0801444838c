//! Three-slot item window over the previous, current and next pages.

/// Number of pages held by the window.
pub const SLOT_COUNT: usize = 3;

/// Slot showing the page before the current one.
pub const SLOT_PREVIOUS: usize = 0;
/// Slot showing the current page.
pub const SLOT_CURRENT: usize = 1;
/// Slot showing the page after the current one.
pub const SLOT_NEXT: usize = 2;

/// Sliding window of the three items adjacent to the current position.
///
/// Slot `k` always corresponds to position `position + k - 1` of the backing
/// sequence; a `None` slot is blank (off either end of the sequence, or not
/// yet fetched). [`CoverWindow::rotate`] keeps surviving items in place when
/// the window moves by one page, so only the slot entering from the trailing
/// edge needs a fresh fetch.
#[derive(Debug)]
pub struct CoverWindow<I> {
    slots: [Option<I>; SLOT_COUNT],
}

impl<I> Default for CoverWindow<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> CoverWindow<I> {
    /// Creates a window with all three slots blank.
    pub fn new() -> Self {
        Self {
            slots: [None, None, None],
        }
    }

    /// Item held by `slot`, if any.
    ///
    /// Panics if `slot` is not below [`SLOT_COUNT`].
    pub fn item(&self, slot: usize) -> Option<&I> {
        self.slots[slot].as_ref()
    }

    /// Stores `item` into `slot`, blanking it on `None`.
    ///
    /// Panics if `slot` is not below [`SLOT_COUNT`].
    pub fn set(&mut self, slot: usize, item: Option<I>) {
        self.slots[slot] = item;
    }

    /// Whether `slot` is blank.
    pub fn is_blank(&self, slot: usize) -> bool {
        self.slots[slot].is_none()
    }

    /// Whether any slot is blank.
    pub fn has_blanks(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// Shifts the window one page in `delta`'s direction.
    ///
    /// Moving forward (`+1`) the old current item becomes the previous one
    /// and the next slot is blanked for refetch; moving backward (`-1`) is
    /// the mirror image. Panics on any other `delta`.
    pub fn rotate(&mut self, delta: i32) {
        match delta {
            1 => {
                self.slots.rotate_left(1);
                self.slots[SLOT_NEXT] = None;
            }
            -1 => {
                self.slots.rotate_right(1);
                self.slots[SLOT_PREVIOUS] = None;
            }
            _ => panic!("window can only rotate one page at a time, got {delta}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(a: i32, b: i32, c: i32) -> CoverWindow<i32> {
        let mut window = CoverWindow::new();
        window.set(SLOT_PREVIOUS, Some(a));
        window.set(SLOT_CURRENT, Some(b));
        window.set(SLOT_NEXT, Some(c));
        window
    }

    #[test]
    fn test_new_window_is_blank() {
        let window: CoverWindow<i32> = CoverWindow::new();
        assert!(window.has_blanks());
        for slot in 0..SLOT_COUNT {
            assert!(window.is_blank(slot));
            assert!(window.item(slot).is_none());
        }
    }

    #[test]
    fn test_rotate_forward_blanks_trailing_slot() {
        let mut window = window_of(10, 11, 12);
        window.rotate(1);
        assert_eq!(window.item(SLOT_PREVIOUS), Some(&11));
        assert_eq!(window.item(SLOT_CURRENT), Some(&12));
        assert!(window.is_blank(SLOT_NEXT));
    }

    #[test]
    fn test_rotate_backward_blanks_leading_slot() {
        let mut window = window_of(10, 11, 12);
        window.rotate(-1);
        assert!(window.is_blank(SLOT_PREVIOUS));
        assert_eq!(window.item(SLOT_CURRENT), Some(&10));
        assert_eq!(window.item(SLOT_NEXT), Some(&11));
    }

    #[test]
    fn test_rotate_round_trip_loses_only_the_edges() {
        let mut window = window_of(1, 2, 3);
        window.rotate(1);
        window.rotate(-1);
        assert!(window.is_blank(SLOT_PREVIOUS));
        assert_eq!(window.item(SLOT_CURRENT), Some(&2));
        assert_eq!(window.item(SLOT_NEXT), Some(&3));
    }

    #[test]
    #[should_panic(expected = "one page at a time")]
    fn test_rotate_rejects_wide_jumps() {
        let mut window = window_of(1, 2, 3);
        window.rotate(2);
    }
}
