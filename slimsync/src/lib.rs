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

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Blocking synchronization primitives built in the monitor style.
//!
//! Every primitive in this crate keeps a few counters behind one internal lock and blocks
//! threads on one condition variable. Acquisitions hand out a [`Releaser`] token that undoes the
//! acquisition exactly once, when it is released explicitly or when it goes out of scope.
//!
//! * [`Mutex`](mutex::Mutex): one holder at a time.
//! * [`RwLock`](rwlock::RwLock): many readers or one writer, preferring writers.
//! * [`Semaphore`](semaphore::Semaphore): up to `capacity` holders, with a capacity that can
//!   change at runtime.
//!
//! All of them offer a timed variant of every blocking acquisition. A timed attempt that runs
//! out of time is not an error: it returns a null token whose
//! [`is_acquired`](Releaser::is_acquired) is `false`.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use slimsync::mutex::Mutex;
//!
//! let mutex = Arc::new(Mutex::new());
//! let guard = mutex.enter();
//!
//! let m = mutex.clone();
//! std::thread::spawn(move || {
//!     let attempt = m.try_enter(Duration::from_millis(10));
//!     assert!(!attempt.is_acquired());
//! })
//! .join()
//! .unwrap();
//!
//! drop(guard);
//! assert!(!mutex.is_entered());
//! ```
//!
//! # Features
//!
//! * `tracing`: emit [`tracing`](https://docs.rs/tracing) events when threads wait, time out or
//!   change a semaphore's capacity.
//! * `invariants`: keep internal invariant checks in release builds.

mod error;
mod internal;
mod releaser;
mod util;

pub mod mutex;
pub mod rwlock;
pub mod semaphore;

pub use error::Error;
pub use releaser::Releaser;
