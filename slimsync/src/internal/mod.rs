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

//! The internal building blocks shared by every primitive in this crate.
//!
//! Each primitive owns exactly one [`Monitor`] around its state. All reads and writes of that
//! state happen through the monitor, and blocking always happens inside the monitor's wait region
//! so that the decision to sleep is atomic with the check that led to it.

mod contract;
mod monitor;
mod stopwatch;

pub(crate) use contract::ensure_greater;
pub(crate) use contract::ensure_less_or_equal;
pub(crate) use contract::invariant;
pub(crate) use monitor::Monitor;
pub(crate) use monitor::MonitorGuard;
pub(crate) use stopwatch::Stopwatch;
