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

use std::time::Duration;
use std::time::Instant;

/// Measures the time spent inside one timed acquisition call.
///
/// Started once when the call begins; the remaining budget is always derived from the elapsed
/// time on the monotonic clock rather than from repeated wall-clock readings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub(crate) fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns what is left of `timeout`, or `None` once it is used up.
    pub(crate) fn remaining(&self, timeout: Duration) -> Option<Duration> {
        timeout
            .checked_sub(self.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }
}
