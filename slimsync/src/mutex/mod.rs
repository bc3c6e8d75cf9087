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

//! A blocking mutual exclusion lock with timed entry.

use std::fmt;
use std::time::Duration;

use crate::internal::invariant;
use crate::internal::Monitor;
use crate::internal::Stopwatch;
use crate::releaser::Releaser;
use crate::util::trace;


/// A mutual exclusion lock that admits one holder at a time.
///
/// The mutex does not own the data it protects; holding the [`MutexGuard`] returned by
/// [`enter`] is what grants access to whatever resource the mutex stands for.
///
/// The mutex is not reentrant: a thread that calls [`enter`] while it already holds the mutex
/// blocks forever. Waiters are not served in arrival order.
///
/// [`enter`]: Mutex::enter
pub struct Mutex {
    m: Monitor<State>,
}

#[derive(Debug)]
struct State {
    entered: bool,
    waiting: usize,
}

/// RAII token that exits the [`Mutex`] when released or dropped.
pub type MutexGuard<'a> = Releaser<'a, Mutex>;

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (entered, waiting) = self.m.with(|s| (s.entered, s.waiting));
        f.debug_struct("Mutex")
            .field("entered", &entered)
            .field("waiting", &waiting)
            .finish_non_exhaustive()
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutex {
    /// Creates a new mutex in the unlocked state.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::mutex::Mutex;
    ///
    /// let mutex = Mutex::new();
    /// assert!(!mutex.is_entered());
    /// ```
    pub const fn new() -> Self {
        Self {
            m: Monitor::new(State {
                entered: false,
                waiting: 0,
            }),
        }
    }

    /// Returns whether the mutex is currently held.
    ///
    /// The answer may be stale as soon as it is returned; use it for diagnostics only.
    pub fn is_entered(&self) -> bool {
        self.m.with(|s| s.entered)
    }

    /// Returns the number of threads blocked in [`enter`] or [`try_enter`].
    ///
    /// [`enter`]: Mutex::enter
    /// [`try_enter`]: Mutex::try_enter
    pub fn waiting(&self) -> usize {
        self.m.with(|s| s.waiting)
    }

    /// Enters the mutex, blocking the current thread until every preceding holder has exited.
    ///
    /// This call might never return if the mutex is never released.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::mutex::Mutex;
    ///
    /// let mutex = Mutex::new();
    /// {
    ///     let _guard = mutex.enter();
    ///     assert!(mutex.is_entered());
    /// }
    /// assert!(!mutex.is_entered());
    /// ```
    pub fn enter(&self) -> MutexGuard<'_> {
        let mut state = self.m.lock();
        state.waiting += 1;
        if state.entered {
            trace!(waiting = state.waiting, "Mutex::enter -> waiting");
        }

        let mut state = self.m.wait_while(state, |s| s.entered);
        state.entered = true;
        state.waiting -= 1;
        Releaser::new(self, Mutex::exit)
    }

    /// Attempts to enter the mutex, blocking for at most `timeout`.
    ///
    /// The returned guard is null if the mutex could not be entered in time; check
    /// [`Releaser::is_acquired`]. Running out of time is not an error and leaves the mutex as it
    /// was. A zero `timeout` enters only if the mutex is free right now.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use slimsync::mutex::Mutex;
    ///
    /// let mutex = Mutex::new();
    /// let first = mutex.try_enter(Duration::from_millis(10));
    /// assert!(first.is_acquired());
    ///
    /// let second = mutex.try_enter(Duration::from_millis(10));
    /// assert!(!second.is_acquired());
    /// ```
    pub fn try_enter(&self, timeout: Duration) -> MutexGuard<'_> {
        let stopwatch = Stopwatch::start();
        let mut state = self.m.lock();
        state.waiting += 1;

        let (mut state, timed_out) =
            self.m.wait_while_for(state, &stopwatch, timeout, |s| s.entered);
        state.waiting -= 1;
        if timed_out {
            trace!(?timeout, "Mutex::try_enter -> timed out");
            return Releaser::null();
        }

        state.entered = true;
        Releaser::new(self, Mutex::exit)
    }

    fn exit(&self) {
        let mut state = self.m.lock();
        invariant!(state.entered, "exiting a mutex that is not entered");
        state.entered = false;
        self.m.notify_one();
    }
}
