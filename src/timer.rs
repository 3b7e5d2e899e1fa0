use crate::prelude::*;

/// Opaque handle to a scheduled timer, returned by [`TimerWheel::schedule`].
/// Used to cancel a timer before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u32);

enum Period {
    Once,
    Every(u64),
}

struct Entry {
    handle: TimerHandle,
    deadline: u64,
    period: Period,
    callback: Box<dyn FnMut()>,
}

/// A cooperative timer wheel: callers advance time explicitly by calling
/// [`TimerWheel::tick`] with the current monotonic millisecond count, and
/// every timer whose deadline has passed fires in deadline order.
///
/// There is no background thread and nothing here reads a system clock —
/// the driver owns time, matching the "caller supplies now_ms" design used
/// throughout this stack (heartbeat production, SDO timeouts, PDO inhibit
/// and event timers, node-guarding all schedule through one wheel instead
/// of each keeping an ad hoc counter).
///
/// Entries are kept in a plain sorted `Vec` rather than a binary heap: a
/// CANopen node schedules on the order of a dozen timers (one per PDO, one
/// heartbeat, a handful of SDO sessions), so linear insertion is simpler
/// than a heap and the cost difference is not observable at that count.
pub struct TimerWheel {
    entries: Vec<Entry>,
    next_handle: u32,
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerWheel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 0,
        }
    }

    fn insert(&mut self, deadline: u64, period: Period, callback: Box<dyn FnMut()>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        let entry = Entry { handle, deadline, period, callback };
        let pos = self
            .entries
            .iter()
            .position(|e| e.deadline > deadline)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        handle
    }

    /// Fires `callback` once, `delay_ms` after `now_ms`.
    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, callback: Box<dyn FnMut()>) -> TimerHandle {
        self.insert(now_ms + delay_ms, Period::Once, callback)
    }

    /// Fires `callback` every `period_ms`, first firing at `now_ms + period_ms`.
    /// A `period_ms` of 0 disables the timer immediately (used by comm.
    /// parameters like the heartbeat producer time, where 0 means "off").
    pub fn schedule_periodic(&mut self, now_ms: u64, period_ms: u64, callback: Box<dyn FnMut()>) -> Option<TimerHandle> {
        if period_ms == 0 {
            return None;
        }
        Some(self.insert(now_ms + period_ms, Period::Every(period_ms), callback))
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Fires every timer whose deadline is `<= now_ms`, in deadline order.
    /// Periodic timers are rescheduled for their next period; one-shot
    /// timers are removed after firing.
    pub fn tick(&mut self, now_ms: u64) {
        loop {
            let due_idx = self.entries.iter().position(|e| e.deadline <= now_ms);
            let idx = match due_idx {
                Some(idx) => idx,
                None => break,
            };
            let mut entry = self.entries.remove(idx);
            (entry.callback)();
            if let Period::Every(period) = entry.period {
                entry.deadline = now_ms + period;
                let pos = self
                    .entries
                    .iter()
                    .position(|e| e.deadline > entry.deadline)
                    .unwrap_or(self.entries.len());
                self.entries.insert(pos, entry);
            }
        }
    }

    /// Milliseconds until the next timer fires, or `None` if nothing is
    /// scheduled. Drivers with a low-power sleep mode can use this to pick
    /// how long to sleep before the next `tick`.
    pub fn next_deadline(&self, now_ms: u64) -> Option<u64> {
        self.entries.first().map(|e| e.deadline.saturating_sub(now_ms))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use alloc::rc::Rc;

    #[test]
    fn one_shot_fires_once_and_is_removed() {
        let mut wheel = TimerWheel::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        wheel.schedule_once(0, 100, Box::new(move || *count_clone.borrow_mut() += 1));

        wheel.tick(50);
        assert_eq!(*count.borrow(), 0);

        wheel.tick(100);
        assert_eq!(*count.borrow(), 1);

        wheel.tick(200);
        assert_eq!(*count.borrow(), 1);
        assert!(wheel.is_empty());
    }

    #[test]
    fn periodic_reschedules_after_firing() {
        let mut wheel = TimerWheel::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        wheel.schedule_periodic(0, 1000, Box::new(move || *count_clone.borrow_mut() += 1));

        wheel.tick(1000);
        assert_eq!(*count.borrow(), 1);
        wheel.tick(2000);
        assert_eq!(*count.borrow(), 2);
        wheel.tick(2999);
        assert_eq!(*count.borrow(), 2);
        wheel.tick(3000);
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn zero_period_disables_timer() {
        let mut wheel = TimerWheel::new();
        let handle = wheel.schedule_periodic(0, 0, Box::new(|| {}));
        assert!(handle.is_none());
        assert!(wheel.is_empty());
    }

    #[test]
    fn cancel_prevents_future_firing() {
        let mut wheel = TimerWheel::new();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        let handle = wheel.schedule_once(0, 100, Box::new(move || *count_clone.borrow_mut() += 1));
        wheel.cancel(handle);
        wheel.tick(100);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn fires_multiple_due_timers_in_deadline_order() {
        let mut wheel = TimerWheel::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let order_a = order.clone();
        wheel.schedule_once(0, 200, Box::new(move || order_a.borrow_mut().push(2)));
        let order_b = order.clone();
        wheel.schedule_once(0, 100, Box::new(move || order_b.borrow_mut().push(1)));

        wheel.tick(500);
        assert_eq!(*order.borrow(), vec![1, 2]);
    }
}
