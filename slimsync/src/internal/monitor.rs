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

use std::sync::Condvar;
use std::sync::PoisonError;
use std::time::Duration;

use crate::internal::Stopwatch;

pub(crate) type MonitorGuard<'a, T> = std::sync::MutexGuard<'a, T>;

/// State guarded by an exclusive lock, paired with a condition variable to block on.
///
/// Poisoning is ignored: state transitions never leave the guarded value half-updated, and a
/// panic inside a caller's critical section happens outside of the monitor anyway.
#[derive(Debug)]
pub(crate) struct Monitor<T> {
    state: std::sync::Mutex<T>,
    cond: Condvar,
}

impl<T> Monitor<T> {
    pub(crate) const fn new(t: T) -> Self {
        Self {
            state: std::sync::Mutex::new(t),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MonitorGuard<'_, T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut state = self.lock();
        f(&mut state)
    }

    /// Blocks while `blocked` returns true, re-checking after every wakeup.
    pub(crate) fn wait_while<'a, F>(
        &self,
        mut guard: MonitorGuard<'a, T>,
        mut blocked: F,
    ) -> MonitorGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        while blocked(&mut guard) {
            guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
        guard
    }

    /// Blocks while `blocked` returns true, or until `timeout` has elapsed on `stopwatch`.
    ///
    /// Returns the guard and whether the wait gave up. When the budget is exhausted the attempt
    /// is abandoned without a final wait; the condition is always re-checked first, so a waiter
    /// woken right at its deadline still gets in.
    pub(crate) fn wait_while_for<'a, F>(
        &self,
        mut guard: MonitorGuard<'a, T>,
        stopwatch: &Stopwatch,
        timeout: Duration,
        mut blocked: F,
    ) -> (MonitorGuard<'a, T>, bool)
    where
        F: FnMut(&mut T) -> bool,
    {
        while blocked(&mut guard) {
            let Some(remaining) = stopwatch.remaining(timeout) else {
                return (guard, true);
            };
            guard = self
                .cond
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        (guard, false)
    }

    pub(crate) fn notify_one(&self) {
        self.cond.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        self.cond.notify_all();
    }
}
