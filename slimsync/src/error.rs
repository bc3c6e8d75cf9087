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

/// An error returned when a constructor or a state-changing operation is called with an invalid
/// argument.
///
/// The check happens before any state is touched, so a primitive that returned this error is left
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid argument `{name}`: expected greater than {bound}, found {value}")]
    NotGreater {
        name: &'static str,
        bound: usize,
        value: usize,
    },
    #[error("invalid argument `{name}`: expected less than or equal to {bound}, found {value}")]
    NotLessOrEqual {
        name: &'static str,
        bound: usize,
        value: usize,
    },
}

impl Error {
    /// Returns the name of the argument that failed validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::semaphore::Semaphore;
    ///
    /// let err = Semaphore::new(0, 0).unwrap_err();
    /// assert_eq!(err.name(), "capacity");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Error::NotGreater { name, .. } | Error::NotLessOrEqual { name, .. } => name,
        }
    }
}
