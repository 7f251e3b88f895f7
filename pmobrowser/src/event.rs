//! Event : contenu publié par un observable, consommé une seule fois

use std::sync::atomic::{AtomicBool, Ordering};

/// Wrapper for content exposed through an [`Observable`](crate::Observable)
/// that must be acted upon only once, even when several observers see it.
#[derive(Debug)]
pub struct Event<T> {
    content: T,
    handled: AtomicBool,
}

impl<T> Event<T> {
    pub fn new(content: T) -> Self {
        Self {
            content,
            handled: AtomicBool::new(false),
        }
    }

    pub fn has_been_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Returns the content the first time only, `None` afterwards.
    pub fn content_if_not_handled(&self) -> Option<&T> {
        if self.handled.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(&self.content)
        }
    }

    /// Returns the content, even if it has already been handled.
    pub fn peek_content(&self) -> &T {
        &self.content
    }
}
