use super::*;

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    id: i64,
    due_at: i64,
    order: i64,
    task: T,
}

/// Snapshot of one queued deferred step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
    pub label: String,
}

/// Virtual-time timer queue. Time only moves when the owner advances it, and
/// tasks run in `(due_at, order)` order so equal deadlines keep FIFO order.
#[derive(Debug, Clone)]
pub(crate) struct Scheduler<T> {
    task_queue: Vec<ScheduledTask<T>>,
    now_ms: i64,
    step_limit: usize,
    next_timer_id: i64,
    next_task_order: i64,
}

impl<T> Scheduler<T> {
    pub(crate) fn new(step_limit: usize) -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            step_limit,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn step_limit(&self) -> usize {
        self.step_limit
    }

    pub(crate) fn set_step_limit(&mut self, max_steps: usize) {
        self.step_limit = max_steps;
    }

    pub(crate) fn schedule(&mut self, delay_ms: i64, task: T) -> (i64, i64) {
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            task,
        });
        (id, due_at)
    }

    pub(crate) fn clear(&mut self, id: i64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != id);
        before != self.task_queue.len()
    }

    pub(crate) fn clear_all(&mut self) -> usize {
        let cleared = self.task_queue.len();
        self.task_queue.clear();
        cleared
    }

    pub(crate) fn pending(&self, label: impl Fn(&T) -> String) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                label: label(&task.task),
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub(crate) fn set_now(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
    }

    /// Removes and returns the next task due at or before `due_limit`
    /// (any task when `None`), moving the clock forward to its deadline.
    pub(crate) fn pop_next(&mut self, due_limit: Option<i64>) -> Option<(i64, T)> {
        let next_idx = self
            .task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)?;
        let task = self.task_queue.remove(next_idx);
        if task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        Some((task.id, task.task))
    }

    pub(crate) fn step_limit_error(&self) -> Error {
        Error::TimerStepLimit {
            limit: self.step_limit,
            now_ms: self.now_ms,
            pending: self.task_queue.len(),
        }
    }
}
