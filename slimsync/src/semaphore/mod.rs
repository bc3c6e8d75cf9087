// Copyright 2024 tison <wander4096@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A blocking counting semaphore with a capacity that can change at runtime.

use std::fmt;
use std::time::Duration;

use crate::internal::ensure_greater;
use crate::internal::ensure_less_or_equal;
use crate::internal::Monitor;
use crate::internal::MonitorGuard;
use crate::internal::Stopwatch;
use crate::releaser::Releaser;
use crate::util::debug;
use crate::util::trace;
use crate::Error;

#[cfg(test)]
mod tests;

/// A counting semaphore that admits up to `capacity` holders at a time.
///
/// The semaphore counts *entered* holders. [`enter`] takes a slot, blocking while the semaphore
/// is full, and returns a [`SemaphorePermit`] that gives the slot back. The raw [`increment`] and
/// [`decrement`] transitions are exposed as well for callers that pair them up themselves. A
/// permit released after a raw [`decrement`] already gave its slot back leaves the count at zero.
///
/// Every state change wakes all waiters, each of which re-checks its own condition. Waiters are
/// not served in arrival order.
///
/// [`enter`]: Semaphore::enter
/// [`increment`]: Semaphore::increment
/// [`decrement`]: Semaphore::decrement
pub struct Semaphore {
    m: Monitor<State>,
}

#[derive(Debug)]
struct State {
    capacity: usize,
    entered: usize,
    waiting: usize,
}

impl State {
    fn is_full(&self) -> bool {
        self.capacity <= self.entered
    }

    fn is_empty(&self) -> bool {
        self.entered == 0
    }

    fn balance(&self) -> isize {
        // both sides are bounded by MAX_CAPACITY
        self.entered as isize - self.capacity as isize
    }
}

/// RAII token that gives a slot back to the [`Semaphore`] when released or dropped.
pub type SemaphorePermit<'a> = Releaser<'a, Semaphore>;

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (capacity, entered, waiting) = self.m.with(|s| (s.capacity, s.entered, s.waiting));
        f.debug_struct("Semaphore")
            .field("capacity", &capacity)
            .field("entered", &entered)
            .field("waiting", &waiting)
            .finish_non_exhaustive()
    }
}

impl Default for Semaphore {
    /// A semaphore with a capacity of one and no holders.
    fn default() -> Self {
        Self::from_parts(1, 0)
    }
}

impl Semaphore {
    /// The largest capacity a semaphore accepts, so that `entered - capacity` fits in an
    /// `isize`.
    pub const MAX_CAPACITY: usize = isize::MAX as usize;

    /// Constructs a `Semaphore` with the given capacity and `entered` slots already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero or above [`MAX_CAPACITY`], or `entered` exceeds
    /// `capacity`.
    ///
    /// [`MAX_CAPACITY`]: Semaphore::MAX_CAPACITY
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::semaphore::Semaphore;
    ///
    /// let sem = Semaphore::new(4, 1).unwrap();
    /// assert_eq!(sem.capacity(), 4);
    /// assert_eq!(sem.entered(), 1);
    ///
    /// assert!(Semaphore::new(0, 0).is_err());
    /// assert!(Semaphore::new(2, 3).is_err());
    /// ```
    pub fn new(capacity: usize, entered: usize) -> Result<Self, Error> {
        ensure_greater(capacity, 0, "capacity")?;
        ensure_less_or_equal(capacity, Self::MAX_CAPACITY, "capacity")?;
        ensure_less_or_equal(entered, capacity, "entered")?;
        Ok(Self::from_parts(capacity, entered))
    }

    /// Constructs an empty `Semaphore` with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero or above [`MAX_CAPACITY`](Semaphore::MAX_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::new(capacity, 0)
    }

    const fn from_parts(capacity: usize, entered: usize) -> Self {
        Self {
            m: Monitor::new(State {
                capacity,
                entered,
                waiting: 0,
            }),
        }
    }

    /// Returns the current capacity.
    pub fn capacity(&self) -> usize {
        self.m.with(|s| s.capacity)
    }

    /// Returns the number of slots currently taken.
    pub fn entered(&self) -> usize {
        self.m.with(|s| s.entered)
    }

    /// Returns the number of threads blocked in an increment or decrement.
    ///
    /// Threads blocked in [`set_capacity`](Semaphore::set_capacity) are not counted.
    pub fn waiting(&self) -> usize {
        self.m.with(|s| s.waiting)
    }

    /// Takes one slot, blocking while the semaphore is full.
    ///
    /// Returns `entered - capacity` after the transition, which is zero when this call filled
    /// the semaphore and negative otherwise.
    pub fn increment(&self) -> isize {
        let state = self.m.lock();
        let state = self.do_increment(state);
        state.balance()
    }

    /// Gives one slot back, blocking while no slot is taken.
    ///
    /// Returns `entered - capacity` after the transition.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::semaphore::Semaphore;
    ///
    /// let sem = Semaphore::new(2, 2).unwrap();
    /// assert_eq!(sem.decrement(), -1);
    /// assert_eq!(sem.decrement(), -2);
    /// assert_eq!(sem.increment(), -1);
    /// ```
    pub fn decrement(&self) -> isize {
        let mut state = self.m.lock();
        state.waiting += 1;
        if state.is_empty() {
            trace!("Semaphore::decrement -> waiting");
        }

        let mut state = self.m.wait_while(state, |s| s.is_empty());
        state.entered -= 1;
        state.waiting -= 1;
        self.m.notify_all();
        state.balance()
    }

    /// Enters the semaphore, blocking while it is full.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use slimsync::semaphore::Semaphore;
    ///
    /// let sem = Semaphore::with_capacity(2).unwrap();
    /// let _p1 = sem.enter();
    /// let _p2 = sem.enter();
    /// assert_eq!(sem.entered(), 2);
    /// assert!(!sem.try_enter(Duration::ZERO).is_acquired());
    /// ```
    pub fn enter(&self) -> SemaphorePermit<'_> {
        let state = self.m.lock();
        let _state = self.do_increment(state);
        Releaser::new(self, Semaphore::exit)
    }

    /// Attempts to enter the semaphore, blocking for at most `timeout` while it is full.
    ///
    /// Returns a null permit if no slot became free in time.
    pub fn try_enter(&self, timeout: Duration) -> SemaphorePermit<'_> {
        let stopwatch = Stopwatch::start();
        let mut state = self.m.lock();
        state.waiting += 1;

        let (mut state, timed_out) =
            self.m.wait_while_for(state, &stopwatch, timeout, |s| s.is_full());
        state.waiting -= 1;
        if timed_out {
            trace!(?timeout, "Semaphore::try_enter -> timed out");
            return Releaser::null();
        }

        state.entered += 1;
        self.m.notify_all();
        Releaser::new(self, Semaphore::exit)
    }

    /// Changes the capacity of the semaphore.
    ///
    /// Growing the capacity takes effect immediately and wakes waiters. Shrinking it below the
    /// number of entered holders blocks until enough of them have exited. If they never do, this
    /// call never returns.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero or above [`MAX_CAPACITY`](Semaphore::MAX_CAPACITY).
    /// The semaphore is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use slimsync::semaphore::Semaphore;
    ///
    /// let sem = Semaphore::with_capacity(1).unwrap();
    /// let _p1 = sem.enter();
    /// sem.set_capacity(2).unwrap();
    /// assert!(sem.try_enter(Duration::ZERO).is_acquired());
    /// ```
    pub fn set_capacity(&self, capacity: usize) -> Result<(), Error> {
        ensure_greater(capacity, 0, "capacity")?;
        ensure_less_or_equal(capacity, Self::MAX_CAPACITY, "capacity")?;

        let state = self.m.lock();
        if capacity < state.entered {
            trace!(
                capacity,
                entered = state.entered,
                "Semaphore::set_capacity -> waiting for holders to exit"
            );
        }

        let mut state = self.m.wait_while(state, |s| capacity < s.entered);
        let previous = state.capacity;
        state.capacity = capacity;
        debug!(previous, capacity, "Semaphore::set_capacity");
        if capacity > previous {
            self.m.notify_all();
        }
        Ok(())
    }

    fn do_increment<'a>(&self, mut state: MonitorGuard<'a, State>) -> MonitorGuard<'a, State> {
        state.waiting += 1;
        if state.is_full() {
            trace!(
                capacity = state.capacity,
                waiting = state.waiting,
                "Semaphore::increment -> waiting"
            );
        }

        let mut state = self.m.wait_while(state, |s| s.is_full());
        state.entered += 1;
        state.waiting -= 1;
        self.m.notify_all();
        state
    }

    fn exit(&self) {
        let mut state = self.m.lock();
        // a raw decrement may already have given this slot back
        match state.entered.checked_sub(1) {
            Some(entered) => state.entered = entered,
            None => {
                debug!("Semaphore::exit -> slot already given back");
            }
        }
        self.m.notify_all();
    }
}
