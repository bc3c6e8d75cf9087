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

//! Precondition and invariant checks.
//!
//! Preconditions are checked at the public API boundary in every build and reported as an
//! [`Error`] naming the offending argument. Invariants describe this crate's own bookkeeping; a
//! violation is a bug (or a token used outside of its one-shot contract) and panics loudly.
//! Invariant checks cost a comparison each and run with `debug_assertions` or the `invariants`
//! feature.

use crate::Error;

pub(crate) fn ensure_greater(value: usize, bound: usize, name: &'static str) -> Result<(), Error> {
    if value > bound {
        Ok(())
    } else {
        Err(Error::NotGreater { name, bound, value })
    }
}

pub(crate) fn ensure_less_or_equal(
    value: usize,
    bound: usize,
    name: &'static str,
) -> Result<(), Error> {
    if value <= bound {
        Ok(())
    } else {
        Err(Error::NotLessOrEqual { name, bound, value })
    }
}

macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if cfg!(any(debug_assertions, feature = "invariants")) && !$cond {
            panic!("slimsync invariant violated: {}", format_args!($($arg)+));
        }
    };
}

pub(crate) use invariant;
