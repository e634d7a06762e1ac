//! Deferred, time-based callbacks driven by the frame loop.
//!
//! A `Scheduler<T>` owns its own clock. Systems push actions with a delay and
//! drain the ones that came due each frame with [`Scheduler::advance`]. Actions
//! are plain data, so whoever drains them decides what "running" one means.

use std::time::Duration;

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Pending<T> {
    id: u64,
    due: Duration,
    action: T,
}

#[derive(Resource)]
pub struct Scheduler<T: Send + Sync + 'static> {
    clock: Duration,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T: Send + Sync + 'static> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            clock: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T: Send + Sync + 'static> Scheduler<T> {
    pub fn schedule_after(&mut self, delay: Duration, action: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.clock + delay,
            action,
        });
        TaskHandle(id)
    }

    /// Returns `false` when the task already fired or was never scheduled here.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != handle.0);
        self.pending.len() != before
    }

    #[cfg(test)]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|p| p.id == handle.0)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Moves the clock forward and hands back every action that came due,
    /// earliest first, ties broken by scheduling order.
    pub fn advance(&mut self, delta: Duration) -> Vec<T> {
        self.clock += delta;
        let clock = self.clock;

        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= clock);
        self.pending = rest;

        due.sort_by_key(|p| (p.due, p.id));
        due.into_iter().map(|p| p.action).collect()
    }
}

/// Schedules one action per element, the `i`-th after `i * interval`.
pub fn stagger<T, F>(
    scheduler: &mut Scheduler<T>,
    elements: &[Entity],
    interval: f32,
    mut make_action: F,
) -> Vec<TaskHandle>
where
    T: Send + Sync + 'static,
    F: FnMut(Entity) -> T,
{
    elements
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let delay = Duration::from_secs_f32(interval.max(0.0) * i as f32);
            scheduler.schedule_after(delay, make_action(e))
        })
        .collect()
}
