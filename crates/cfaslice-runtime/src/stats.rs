//! Per-worker task statistics.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Running sums for one worker. Times are in microseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker: usize,
    pub task_count: u64,
    pub total_size: u64,
    pub total_size_sq: u64,
    pub total_time: u64,
    pub total_time_sq: u64,
    pub max_time: u64,
    /// Size of the task that took `max_time`.
    pub max_time_size: u64,
    pub wall_time: u64,
}

/// Mean, population variance and standard deviation of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl Moments {
    fn from_sums(count: u64, sum: u64, sum_sq: u64) -> Self {
        if count == 0 {
            return Self::default();
        }
        let n = count as f64;
        let mean = sum as f64 / n;
        // Rounding can push E[x^2] - mean^2 slightly below zero.
        let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
        Self {
            mean,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}

impl WorkerStats {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            ..Self::default()
        }
    }

    pub fn record(&mut self, size: usize, elapsed: Duration) {
        let size = size as u64;
        let time = elapsed.as_micros() as u64;
        if time > self.max_time || self.task_count == 0 {
            self.max_time = time;
            self.max_time_size = size;
        }
        self.task_count += 1;
        self.total_size += size;
        self.total_size_sq += size * size;
        self.total_time += time;
        self.total_time_sq += time * time;
    }

    pub fn finish(&mut self, wall: Duration) {
        self.wall_time = wall.as_micros() as u64;
    }

    pub fn size(&self) -> Moments {
        Moments::from_sums(self.task_count, self.total_size, self.total_size_sq)
    }

    pub fn time(&self) -> Moments {
        Moments::from_sums(self.task_count, self.total_time, self.total_time_sq)
    }

    /// Multi-line report; `unit` names what task sizes count.
    pub fn render(&self, unit: &str) -> String {
        let size = self.size();
        let time = self.time();
        format!(
            "Thread {}\ttime:\t{} us\n\
             Max task time:\t{} us with\t{} {}\n\
             Tasks processed:\t{}\n\
             Task size mean:\t{:.2}, var:\t{:.2}, std dev:\t{:.2}\n\
             Task time mean:\t{:.2}, var:\t{:.2}, std dev:\t{:.2}\n",
            self.worker,
            self.wall_time,
            self.max_time,
            self.max_time_size,
            unit,
            self.task_count,
            size.mean,
            size.variance,
            size.std_dev,
            time.mean,
            time.variance,
            time.std_dev,
        )
    }
}
