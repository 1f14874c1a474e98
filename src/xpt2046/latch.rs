use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// Locked while an acquisition owns the bus.
///
/// The test-and-set runs inside a critical section so it is atomic on cores without
/// compare-and-swap. Both `Xpt2046::get_touch` and `Xpt2046::on_pen_edge` take it before their
/// first exchange and release it once the result is known, on the error path as well.
pub struct InterruptLatch {
    locked: Mutex<Cell<bool>>,
}

impl InterruptLatch {
    pub const fn new() -> Self {
        Self {
            locked: Mutex::new(Cell::new(false)),
        }
    }

    /// Takes the latch. Returns `false` if it was already held.
    pub fn try_lock(&self) -> bool {
        critical_section::with(|cs| {
            let locked = self.locked.borrow(cs);
            if locked.get() {
                false
            } else {
                locked.set(true);
                true
            }
        })
    }

    pub fn release(&self) {
        critical_section::with(|cs| self.locked.borrow(cs).set(false));
    }

    pub fn is_locked(&self) -> bool {
        critical_section::with(|cs| self.locked.borrow(cs).get())
    }
}

impl Default for InterruptLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterruptLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptLatch")
            .field("locked", &self.is_locked())
            .finish()
    }
}
