//! Longest-task-first scheduling of independent analysis units.
//!
//! Units go into a max-heap keyed by weight. Each worker takes the queue lock
//! only long enough to pop the heaviest remaining unit, so the single largest
//! unit is always started first and no worker is left alone with it at the
//! end. Results are collected behind a second lock taken after the unit's
//! work is done.

use crate::config::ExecutionMode;
use crate::stats::WorkerStats;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A weighted unit of work. `index` is the unit's position in enumeration
/// order and breaks weight ties, lower first.
#[derive(Debug, Clone)]
pub struct Task<P> {
    pub index: usize,
    pub weight: usize,
    pub payload: P,
}

impl<P> PartialEq for Task<P> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.index == other.index
    }
}

impl<P> Eq for Task<P> {}

impl<P> Ord for Task<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl<P> PartialOrd for Task<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct TaskResult<R> {
    pub index: usize,
    pub worker: usize,
    pub value: R,
}

#[derive(Debug)]
pub struct ScheduleOutcome<R> {
    /// One entry per task, ordered by task index.
    pub results: Vec<TaskResult<R>>,
    /// One entry per worker that was started.
    pub stats: Vec<WorkerStats>,
    pub elapsed: Duration,
}

impl<R> ScheduleOutcome<R> {
    pub fn values(self) -> impl Iterator<Item = R> {
        self.results.into_iter().map(|result| result.value)
    }
}

pub struct Scheduler<P> {
    queue: BinaryHeap<Task<P>>,
    workers: usize,
    next_index: usize,
}

impl<P> Scheduler<P> {
    /// A worker count of zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            queue: BinaryHeap::new(),
            workers: workers.max(1),
            next_index: 0,
        }
    }

    pub fn with_tasks(workers: usize, tasks: impl IntoIterator<Item = Task<P>>) -> Self {
        let mut scheduler = Self::new(workers);
        scheduler.queue.extend(tasks);
        scheduler.next_index = scheduler
            .queue
            .iter()
            .map(|task| task.index + 1)
            .max()
            .unwrap_or(0);
        scheduler
    }

    /// Enqueues a unit one past the highest index seen so far.
    pub fn push(&mut self, weight: usize, payload: P) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.queue.push(Task {
            index,
            weight,
            payload,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every unit with `work`. `measure` gives the size recorded in the
    /// statistics for a finished unit.
    pub fn execute<R, W, M>(self, mode: ExecutionMode, work: W, measure: M) -> ScheduleOutcome<R>
    where
        P: Send,
        R: Send,
        W: Fn(&P) -> R + Sync,
        M: Fn(&Task<P>, &R) -> usize + Sync,
    {
        match mode {
            ExecutionMode::Sequential => self.run_sequential(work, measure),
            ExecutionMode::Concurrent => self.run(work, measure),
        }
    }

    /// Runs every unit on the calling thread in enumeration order.
    pub fn run_sequential<R, W, M>(self, work: W, measure: M) -> ScheduleOutcome<R>
    where
        W: Fn(&P) -> R,
        M: Fn(&Task<P>, &R) -> usize,
    {
        let started = Instant::now();
        let mut tasks = self.queue.into_vec();
        tasks.sort_by_key(|task| task.index);

        let mut stats = WorkerStats::new(0);
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            let task_start = Instant::now();
            let value = work(&task.payload);
            stats.record(measure(&task, &value), task_start.elapsed());
            debug!(index = task.index, weight = task.weight, "task finished");
            results.push(TaskResult {
                index: task.index,
                worker: 0,
                value,
            });
        }
        stats.finish(started.elapsed());

        ScheduleOutcome {
            results,
            stats: vec![stats],
            elapsed: started.elapsed(),
        }
    }

    /// Runs every unit on a fixed pool of scoped worker threads.
    pub fn run<R, W, M>(self, work: W, measure: M) -> ScheduleOutcome<R>
    where
        P: Send,
        R: Send,
        W: Fn(&P) -> R + Sync,
        M: Fn(&Task<P>, &R) -> usize + Sync,
    {
        let started = Instant::now();
        let task_count = self.queue.len();
        let workers = self.workers;
        info!(tasks = task_count, workers, "starting workers");

        let queue = Mutex::new(self.queue);
        let results = Mutex::new(Vec::with_capacity(task_count));

        let stats = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let queue = &queue;
                    let results = &results;
                    let work = &work;
                    let measure = &measure;
                    scope.spawn(move || {
                        let worker_start = Instant::now();
                        let mut stats = WorkerStats::new(worker);
                        loop {
                            let next = queue.lock().pop();
                            let Some(task) = next else {
                                break;
                            };

                            let task_start = Instant::now();
                            let value = work(&task.payload);
                            stats.record(measure(&task, &value), task_start.elapsed());
                            debug!(
                                worker,
                                index = task.index,
                                weight = task.weight,
                                "task finished"
                            );

                            results.lock().push(TaskResult {
                                index: task.index,
                                worker,
                                value,
                            });
                        }
                        stats.finish(worker_start.elapsed());
                        stats
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect::<Vec<_>>()
        });

        let mut results = results.into_inner();
        results.sort_by_key(|result| result.index);

        ScheduleOutcome {
            results,
            stats,
            elapsed: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn weighted(weights: &[usize]) -> Scheduler<usize> {
        let mut scheduler = Scheduler::new(1);
        for (i, &w) in weights.iter().enumerate() {
            scheduler.push(w, i);
        }
        scheduler
    }

    #[test]
    fn test_single_worker_takes_heaviest_first() {
        let order = Mutex::new(Vec::new());
        let outcome = weighted(&[3, 7, 1, 7, 5]).run(
            |&i| {
                order.lock().push(i);
                i
            },
            |task, _| task.weight,
        );

        assert_eq!(order.into_inner(), vec![1, 3, 4, 0, 2]);
        let indices: Vec<_> = outcome.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcome.stats.len(), 1);
        assert_eq!(outcome.stats[0].task_count, 5);
        assert_eq!(outcome.stats[0].total_size, 23);
    }

    #[test]
    fn test_sequential_runs_in_enumeration_order() {
        let order = Mutex::new(Vec::new());
        weighted(&[3, 7, 1]).run_sequential(
            |&i| order.lock().push(i),
            |task, _| task.weight,
        );
        assert_eq!(order.into_inner(), vec![0, 1, 2]);
    }

    #[test]
    fn test_heavy_task_gets_a_worker_to_itself() {
        let mut scheduler = Scheduler::new(2);
        for weight in [10, 1, 1, 1] {
            scheduler.push(weight, weight);
        }

        let outcome = scheduler.run(
            |&weight| thread::sleep(Duration::from_millis(weight as u64 * 20)),
            |task, _| task.weight,
        );

        assert_eq!(outcome.results.len(), 4);
        let heavy = outcome
            .stats
            .iter()
            .find(|s| s.max_time_size == 10)
            .unwrap();
        assert_eq!(heavy.task_count, 1);
        assert!(heavy.wall_time >= 200_000);

        let light = outcome.stats.iter().find(|s| s.worker != heavy.worker).unwrap();
        assert_eq!(light.task_count, 3);
        assert_eq!(light.total_size, 3);
    }

    #[test]
    fn test_extra_workers_exit_idle() {
        let mut scheduler = Scheduler::new(8);
        scheduler.push(1, ());
        scheduler.push(2, ());

        let outcome = scheduler.run(|_| (), |task, _| task.weight);

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.stats.len(), 8);
        let busy: u64 = outcome.stats.iter().map(|s| s.task_count).sum();
        assert_eq!(busy, 2);
        assert!(outcome.stats.iter().filter(|s| s.task_count == 0).count() >= 6);
    }

    #[test]
    fn test_zero_workers_is_one() {
        let scheduler: Scheduler<()> = Scheduler::new(0);
        assert_eq!(scheduler.workers(), 1);
        let outcome = scheduler.run(|_| (), |_, _| 0);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.stats.len(), 1);
    }

    #[test]
    fn test_push_after_sparse_tasks_gets_a_fresh_index() {
        let tasks = [0, 5].map(|index| Task {
            index,
            weight: 1,
            payload: index,
        });
        let mut scheduler = Scheduler::with_tasks(2, tasks);

        assert_eq!(scheduler.push(1, 6), 6);
        assert_eq!(scheduler.push(9, 7), 7);

        let outcome = scheduler.run(|&payload| payload, |task, _| task.weight);
        let indices: Vec<_> = outcome.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 5, 6, 7]);
        let values: Vec<_> = outcome.values().collect();
        assert_eq!(values, vec![0, 5, 6, 7]);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let mut heap = BinaryHeap::new();
        heap.push(Task { index: 2, weight: 4, payload: () });
        heap.push(Task { index: 0, weight: 4, payload: () });
        heap.push(Task { index: 1, weight: 4, payload: () });

        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|t| t.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
