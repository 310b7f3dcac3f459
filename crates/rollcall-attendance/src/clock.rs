//! Wall-clock abstraction so cooldowns and capture delays can be tested
//! without real waiting.

use chrono::{DateTime, Local, TimeDelta};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// The real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when told to. Clones share the same time.
///
/// `sleep` advances the clock instead of blocking.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Local>>>,
}

impl ManualClock {
    pub fn starting_at(start: DateTime<Local>) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Local>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(delta) = TimeDelta::from_std(duration) {
            self.advance(delta);
        }
    }
}
