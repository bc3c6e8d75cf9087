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

//! A blocking reader-writer lock with writer preference.

use std::fmt;
use std::time::Duration;

use crate::internal::invariant;
use crate::internal::Monitor;
use crate::internal::Stopwatch;
use crate::releaser::Releaser;
use crate::util::trace;


/// A reader-writer lock that admits either any number of readers or a single writer.
///
/// The lock prefers writers: once a writer is waiting, readers that arrive afterwards block
/// until that writer has entered and exited, so a steady stream of readers cannot starve
/// writers. No ordering is promised among waiting writers, nor among waiting readers.
///
/// Like [`Mutex`](crate::mutex::Mutex), the lock gates access to a resource it does not own.
pub struct RwLock {
    m: Monitor<State>,
}

#[derive(Debug)]
struct State {
    /// Zero when idle, the number of readers while read locked, `-1` while write locked.
    lock: isize,
    waiting_readers: usize,
    waiting_writers: usize,
}

impl State {
    fn read_blocked(&self) -> bool {
        self.lock < 0 || self.waiting_writers > 0
    }

    fn write_blocked(&self) -> bool {
        self.lock != 0
    }

    fn entered_readers(&self) -> usize {
        self.lock.max(0).unsigned_abs()
    }

    fn entered_writers(&self) -> usize {
        self.lock.min(0).unsigned_abs()
    }
}

/// RAII token that exits shared read access of a [`RwLock`] when released or dropped.
pub type ReadGuard<'a> = Releaser<'a, RwLock>;

/// RAII token that exits exclusive write access of a [`RwLock`] when released or dropped.
pub type WriteGuard<'a> = Releaser<'a, RwLock>;

impl fmt::Debug for RwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (readers, writers, waiting_readers, waiting_writers) = self.m.with(|s| {
            (
                s.entered_readers(),
                s.entered_writers(),
                s.waiting_readers,
                s.waiting_writers,
            )
        });
        f.debug_struct("RwLock")
            .field("readers", &readers)
            .field("writers", &writers)
            .field("waiting_readers", &waiting_readers)
            .field("waiting_writers", &waiting_writers)
            .finish_non_exhaustive()
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RwLock {
    /// Creates a new reader-writer lock in the idle state.
    pub const fn new() -> Self {
        Self {
            m: Monitor::new(State {
                lock: 0,
                waiting_readers: 0,
                waiting_writers: 0,
            }),
        }
    }

    /// Returns the number of readers currently holding the lock.
    pub fn entered_readers(&self) -> usize {
        self.m.with(|s| s.entered_readers())
    }

    /// Returns the number of writers currently holding the lock, either zero or one.
    pub fn entered_writers(&self) -> usize {
        self.m.with(|s| s.entered_writers())
    }

    /// Returns whether at least one reader holds the lock.
    pub fn is_read_locked(&self) -> bool {
        self.m.with(|s| s.lock > 0)
    }

    /// Returns whether a writer holds the lock.
    pub fn is_write_locked(&self) -> bool {
        self.m.with(|s| s.lock < 0)
    }

    /// Returns the number of threads waiting for read access.
    pub fn waiting_readers(&self) -> usize {
        self.m.with(|s| s.waiting_readers)
    }

    /// Returns the number of threads waiting for write access.
    pub fn waiting_writers(&self) -> usize {
        self.m.with(|s| s.waiting_writers)
    }

    /// Enters the lock with shared read access, blocking until no writer holds it and no writer
    /// is waiting for it.
    ///
    /// Other readers may hold the lock at the same time. Because waiting writers hold back new
    /// readers, a thread that already holds a read lock and asks for another one while a writer
    /// is waiting deadlocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::rwlock::RwLock;
    ///
    /// let lock = RwLock::new();
    /// let _r1 = lock.enter_read();
    /// let _r2 = lock.enter_read();
    /// assert_eq!(lock.entered_readers(), 2);
    /// ```
    pub fn enter_read(&self) -> ReadGuard<'_> {
        let mut state = self.m.lock();
        state.waiting_readers += 1;
        if state.read_blocked() {
            trace!(
                lock = state.lock,
                waiting_writers = state.waiting_writers,
                "RwLock::enter_read -> waiting"
            );
        }

        let mut state = self.m.wait_while(state, |s| s.read_blocked());
        state.lock += 1;
        state.waiting_readers -= 1;
        Releaser::new(self, RwLock::exit_read)
    }

    /// Enters the lock with exclusive write access, blocking until no reader and no other writer
    /// holds it.
    ///
    /// While this call waits, readers that arrive later are held back.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use slimsync::rwlock::RwLock;
    ///
    /// let lock = RwLock::new();
    /// let _w = lock.enter_write();
    /// assert!(lock.is_write_locked());
    /// assert!(!lock.try_enter_read(Duration::ZERO).is_acquired());
    /// ```
    pub fn enter_write(&self) -> WriteGuard<'_> {
        let mut state = self.m.lock();
        state.waiting_writers += 1;
        if state.write_blocked() {
            trace!(lock = state.lock, "RwLock::enter_write -> waiting");
        }

        let mut state = self.m.wait_while(state, |s| s.write_blocked());
        state.lock = -1;
        state.waiting_writers -= 1;
        Releaser::new(self, RwLock::exit_write)
    }

    /// Attempts to enter the lock with shared read access, blocking for at most `timeout`.
    ///
    /// Returns a null guard if read access could not be granted in time.
    pub fn try_enter_read(&self, timeout: Duration) -> ReadGuard<'_> {
        let stopwatch = Stopwatch::start();
        let mut state = self.m.lock();
        state.waiting_readers += 1;

        let (mut state, timed_out) =
            self.m.wait_while_for(state, &stopwatch, timeout, |s| s.read_blocked());
        state.waiting_readers -= 1;
        if timed_out {
            trace!(?timeout, "RwLock::try_enter_read -> timed out");
            return Releaser::null();
        }

        state.lock += 1;
        Releaser::new(self, RwLock::exit_read)
    }

    /// Attempts to enter the lock with exclusive write access, blocking for at most `timeout`.
    ///
    /// Returns a null guard if write access could not be granted in time. Readers held back by
    /// this attempt are let through once it gives up.
    pub fn try_enter_write(&self, timeout: Duration) -> WriteGuard<'_> {
        let stopwatch = Stopwatch::start();
        let mut state = self.m.lock();
        state.waiting_writers += 1;

        let (mut state, timed_out) =
            self.m.wait_while_for(state, &stopwatch, timeout, |s| s.write_blocked());
        state.waiting_writers -= 1;
        if timed_out {
            trace!(?timeout, "RwLock::try_enter_write -> timed out");
            if state.waiting_writers == 0 && state.waiting_readers > 0 {
                self.m.notify_all();
            }
            return Releaser::null();
        }

        state.lock = -1;
        Releaser::new(self, RwLock::exit_write)
    }

    fn exit_read(&self) {
        let mut state = self.m.lock();
        invariant!(
            state.lock > 0,
            "exiting a read lock in state {}",
            state.lock
        );
        state.lock -= 1;
        self.m.notify_all();
    }

    fn exit_write(&self) {
        let mut state = self.m.lock();
        invariant!(
            state.lock == -1,
            "exiting a write lock in state {}",
            state.lock
        );
        state.lock = 0;
        self.m.notify_all();
    }
}
