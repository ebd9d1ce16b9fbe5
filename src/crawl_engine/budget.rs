//! Admission control for page sessions

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Why a request was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    CountExhausted,
    DeadlinePassed,
}

#[derive(Debug)]
struct BudgetState {
    crawled_count: usize,
}

/// Crawl-count and wall-clock budget of one crawl task.
///
/// The count check and the deadline check happen under one lock. A request
/// that passes the count check is counted before the deadline is looked at,
/// so a late request can consume a slot and still be rejected.
#[derive(Debug)]
pub struct CrawlBudget {
    max_crawl_count: usize,
    start_time: Instant,
    max_run_time: Duration,
    state: Mutex<BudgetState>,
}

impl CrawlBudget {
    #[must_use]
    pub fn starting_at(max_crawl_count: usize, max_run_time: Duration, start_time: Instant) -> Self {
        Self {
            max_crawl_count,
            start_time,
            max_run_time,
            state: Mutex::new(BudgetState { crawled_count: 0 }),
        }
    }

    /// Try to admit one page session
    pub fn try_admit(&self) -> Result<(), Rejection> {
        let mut state = self.state.lock();
        if state.crawled_count >= self.max_crawl_count {
            return Err(Rejection::CountExhausted);
        }
        state.crawled_count += 1;
        if self.start_time.elapsed() >= self.max_run_time {
            return Err(Rejection::DeadlinePassed);
        }
        Ok(())
    }

    #[must_use]
    pub fn crawled_count(&self) -> usize {
        self.state.lock().crawled_count
    }

    /// Time left before the deadline, zero once it has passed
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.max_run_time.saturating_sub(self.start_time.elapsed())
    }
}
