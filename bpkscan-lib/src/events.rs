//! Observer list for result presenters.

use crate::error::ScanError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub type ListenerResult = Result<(), Box<dyn std::error::Error>>;

type Listener<T> = Box<dyn FnMut(&T) -> ListenerResult>;

/// Named subscribers, each invoked independently.
///
/// A listener that returns an error or panics is reported as
/// [`ScanError::PresenterFailure`]; the remaining listeners still run.
pub struct Listeners<T: ?Sized> {
    entries: Vec<(String, Listener<T>)>,
}

impl<T: ?Sized> Default for Listeners<T> {
    fn default() -> Self {
        Listeners {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        name: impl Into<String>,
        listener: impl FnMut(&T) -> ListenerResult + 'static,
    ) {
        self.entries.push((name.into(), Box::new(listener)));
    }

    /// Removes every listener registered under `name`. Returns how many were removed.
    pub fn unsubscribe(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(entry_name, _)| entry_name != name);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invokes every listener with `payload` and returns the failures.
    pub fn emit(&mut self, payload: &T) -> Vec<ScanError> {
        let mut failures = Vec::new();
        for (name, listener) in &mut self.entries {
            let message = match panic::catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            let failure = ScanError::PresenterFailure {
                listener: name.clone(),
                message,
            };
            log::warn!("{}", failure);
            failures.push(failure);
        }
        failures
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "listener panicked".to_string()
    }
}
