//! Tick-delayed actions.
//!
//! Work that must wait for a later tick (the activation-time overlap scan of a
//! hitbox) is queued here and drained by the world's own update.

use skirmish_common::EntityId;

/// Work deferred to a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Scan for targets already overlapping a freshly activated hitbox.
    ScanHitbox {
        /// Actor wielding the hitbox.
        owner: EntityId,
        /// Activation the scan belongs to. A stale scan is a no-op.
        activation: u64,
    },
}

/// An action waiting for its delay to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAction {
    /// Ticks left before the action runs.
    pub delay_ticks: u32,
    /// The action itself.
    pub action: DeferredAction,
}

/// FIFO queue of tick-delayed actions.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<ScheduledAction>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an action to run after `delay_ticks` calls to [`Scheduler::advance`].
    ///
    /// A delay of zero behaves like one: nothing runs before the next tick.
    pub fn schedule(&mut self, action: DeferredAction, delay_ticks: u32) {
        self.pending.push(ScheduledAction {
            delay_ticks: delay_ticks.max(1),
            action,
        });
    }

    /// Counts down every pending action and returns those now due, in the
    /// order they were scheduled.
    pub fn advance(&mut self) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        self.pending.retain_mut(|scheduled| {
            scheduled.delay_ticks -= 1;
            if scheduled.delay_ticks == 0 {
                due.push(scheduled.action);
                false
            } else {
                true
            }
        });
        due
    }

    /// Number of actions still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(activation: u64) -> DeferredAction {
        DeferredAction::ScanHitbox {
            owner: EntityId::from_raw(1),
            activation,
        }
    }

    #[test]
    fn test_runs_exactly_after_delay() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(scan(1), 1);
        scheduler.schedule(scan(2), 2);

        assert_eq!(scheduler.advance(), vec![scan(1)]);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.advance(), vec![scan(2)]);
        assert!(scheduler.advance().is_empty());
    }

    #[test]
    fn test_zero_delay_waits_one_tick() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(scan(1), 0);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.advance(), vec![scan(1)]);
    }

    #[test]
    fn test_preserves_schedule_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(scan(3), 1);
        scheduler.schedule(scan(1), 1);
        assert_eq!(scheduler.advance(), vec![scan(3), scan(1)]);
    }
}
