//! Deterministic scheduler for sequential effects.
//!
//! A task is a list of steps, each due some delay after the previous one.
//! Time only moves when [`Scheduler::advance`] is called, so the caller
//! owns the clock (a browser animation frame, a test, a fixed tick).

use std::time::Duration;

use tracing::debug;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// The raw handle, for callers that keep ids outside Rust.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone)]
struct Pending<A> {
    due: Duration,
    /// Scheduling order; breaks ties between equal `due`.
    seq: u64,
    task: TaskId,
    action: A,
}

#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    now: Duration,
    pending: Vec<Pending<A>>,
    next_task: u64,
    next_seq: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            pending: Vec::new(),
            next_task: 1,
            next_seq: 0,
        }
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `steps`; each delay is relative to the step before it, the
    /// first relative to now.
    pub fn schedule(&mut self, steps: impl IntoIterator<Item = (Duration, A)>) -> TaskId {
        let task = TaskId(self.next_task);
        self.next_task += 1;
        let mut due = self.now;
        for (delay, action) in steps {
            due = due.saturating_add(delay);
            self.pending.push(Pending {
                due,
                seq: self.next_seq,
                task,
                action,
            });
            self.next_seq += 1;
        }
        task
    }

    /// Move the clock forward and return every action now due, earliest
    /// first.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<A> {
        self.now = self.now.saturating_add(elapsed);
        let now = self.now;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.due, p.seq));
        due.into_iter().map(|p| p.action).collect()
    }

    /// Drop the task's pending steps. Returns how many were dropped.
    pub fn cancel(&mut self, task: TaskId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.task != task);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(task = task.0, dropped, "task cancelled");
        }
        dropped
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn delays_are_relative() {
        let mut s = Scheduler::new();
        s.schedule([(ms(0), 'a'), (ms(100), 'b'), (ms(100), 'c')]);
        assert_eq!(s.advance(ms(0)), vec!['a']);
        assert_eq!(s.advance(ms(150)), vec!['b']);
        assert_eq!(s.advance(ms(50)), vec!['c']);
        assert!(s.is_idle());
    }

    #[test]
    fn ties_keep_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule([(ms(10), 1)]);
        s.schedule([(ms(10), 2)]);
        s.schedule([(ms(5), 0)]);
        assert_eq!(s.advance(ms(10)), vec![0, 1, 2]);
    }

    #[test]
    fn cancel_drops_only_that_task() {
        let mut s = Scheduler::new();
        let a = s.schedule([(ms(10), "a1"), (ms(10), "a2")]);
        s.schedule([(ms(15), "b")]);
        assert_eq!(s.advance(ms(10)), vec!["a1"]);
        assert_eq!(s.cancel(a), 1);
        assert_eq!(s.cancel(a), 0);
        assert_eq!(s.advance(ms(100)), vec!["b"]);
    }

    #[test]
    fn huge_delays_saturate() {
        let mut s = Scheduler::new();
        s.schedule([(Duration::MAX, 'a'), (ms(1), 'b')]);
        assert!(s.advance(ms(10)).is_empty());
        assert_eq!(s.advance(Duration::MAX), vec!['a', 'b']);
        assert_eq!(s.now(), Duration::MAX);
        assert!(s.advance(ms(1)).is_empty());
    }

    #[test]
    fn task_ids_survive_a_round_trip() {
        let mut s = Scheduler::new();
        let raw = s.schedule([(ms(5), ())]).get();
        assert_eq!(s.cancel(TaskId::from(raw)), 1);
    }

    #[test]
    fn scheduling_later_starts_from_now() {
        let mut s = Scheduler::new();
        s.advance(ms(1000));
        s.schedule([(ms(10), ())]);
        assert!(s.advance(ms(9)).is_empty());
        assert_eq!(s.advance(ms(1)).len(), 1);
        assert_eq!(s.now(), ms(1020));
    }
}
