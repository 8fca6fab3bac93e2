//! Tick-keyed schedule for deferred sends.
//!
//! Hosts use it for delayed side effects ("revive this robot in ten
//! seconds"): an item scheduled for tick `t` is handed back by
//! [`TickSchedule::take_due`] once the bus reaches `t`.

use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct TickSchedule<T> {
    slots: BTreeMap<u64, Vec<T>>,
    len: usize,
}

impl<T> TickSchedule<T> {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn schedule(&mut self, tick: u64, item: T) {
        self.slots.entry(tick).or_default().push(item);
        self.len += 1;
    }

    /// Remove and return every item scheduled at or before `now`, ordered by
    /// tick and then by scheduling order.
    pub fn take_due(&mut self, now: u64) -> Vec<T> {
        let later = match now.checked_add(1) {
            Some(next) => self.slots.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.slots, later);
        let items: Vec<T> = due.into_values().flatten().collect();
        self.len -= items.len();
        items
    }

    pub fn next_tick(&self) -> Option<u64> {
        self.slots.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for TickSchedule<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_items_come_out_in_tick_then_insertion_order() {
        let mut schedule = TickSchedule::new();
        schedule.schedule(5, "c");
        schedule.schedule(2, "a");
        schedule.schedule(2, "b");
        schedule.schedule(9, "d");

        assert_eq!(schedule.next_tick(), Some(2));
        assert!(schedule.take_due(1).is_empty());
        assert_eq!(schedule.take_due(5), vec!["a", "b", "c"]);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.next_tick(), Some(9));
    }

    #[test]
    fn past_ticks_are_due_immediately() {
        let mut schedule = TickSchedule::new();
        schedule.schedule(0, 1);
        assert_eq!(schedule.take_due(100), vec![1]);
        assert!(schedule.is_empty());
    }

    #[test]
    fn max_tick_drains_everything() {
        let mut schedule = TickSchedule::new();
        schedule.schedule(u64::MAX, 7);
        schedule.schedule(3, 6);
        assert_eq!(schedule.take_due(u64::MAX), vec![6, 7]);
        assert!(schedule.is_empty());
    }
}
