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

//! The one-shot release token handed out by every acquisition.

use std::fmt;


/// RAII token that undoes exactly one acquisition of a primitive.
///
/// Every acquisition call returns a `Releaser`, including a timed attempt that gave up. In that
/// case the token is *null*: [`is_acquired`] returns `false` and releasing it does nothing.
///
/// The release action runs the first time the token is released, either explicitly through
/// [`release`] or when the token is dropped, including while unwinding from a panic. Any later
/// release is a no-op, so an explicit release followed by the end of the scope is safe.
///
/// [`is_acquired`]: Releaser::is_acquired
/// [`release`]: Releaser::release
#[must_use = "if unused the primitive will immediately be released"]
pub struct Releaser<'a, P> {
    acquired: bool,
    release: Option<(&'a P, fn(&P))>,
}

impl<'a, P> Releaser<'a, P> {
    pub(crate) fn new(primitive: &'a P, release: fn(&P)) -> Self {
        Self {
            acquired: true,
            release: Some((primitive, release)),
        }
    }

    pub(crate) const fn null() -> Self {
        Self {
            acquired: false,
            release: None,
        }
    }

    /// Returns whether the acquisition that produced this token succeeded.
    ///
    /// This is `false` only for the token of a timed attempt that ran out of time, and does not
    /// change when the token is released.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// Returns whether this token still holds the primitive, i.e. it was acquired and has not
    /// been released yet.
    pub fn is_held(&self) -> bool {
        self.release.is_some()
    }

    /// Releases the primitive now instead of at the end of the scope.
    ///
    /// Only the first call has an effect.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimsync::mutex::Mutex;
    ///
    /// let mutex = Mutex::new();
    /// let mut guard = mutex.enter();
    /// guard.release();
    /// assert!(!mutex.is_entered());
    ///
    /// // a second release, and the drop at the end of the scope, do nothing
    /// guard.release();
    /// ```
    pub fn release(&mut self) {
        if let Some((primitive, release)) = self.release.take() {
            release(primitive);
        }
    }
}

impl<P> Drop for Releaser<'_, P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<P> fmt::Debug for Releaser<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Releaser")
            .field("acquired", &self.acquired)
            .field("held", &self.is_held())
            .finish()
    }
}
