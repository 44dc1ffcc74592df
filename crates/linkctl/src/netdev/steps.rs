//! Ordered side effects of a transition.

use linkctl_common::{LinkError, LinkResult};

/// Runs the steps of one transition and reports how far it got.
///
/// A failure before any step completed is returned as is; a later failure is
/// wrapped in [`LinkError::PartiallyApplied`] naming the completed steps.
#[derive(Debug)]
pub(crate) struct Steps {
    operation: &'static str,
    link: String,
    completed: Vec<&'static str>,
}

impl Steps {
    pub(crate) fn new(operation: &'static str, link: &str) -> Self {
        Self {
            operation,
            link: link.to_string(),
            completed: Vec::new(),
        }
    }

    pub(crate) fn run<T>(
        &mut self,
        step: &'static str,
        f: impl FnOnce() -> LinkResult<T>,
    ) -> LinkResult<T> {
        match f() {
            Ok(value) => {
                tracing::debug!(operation = self.operation, link = %self.link, step, "Step applied");
                self.completed.push(step);
                Ok(value)
            }
            Err(e) if self.completed.is_empty() => Err(e),
            Err(e) => Err(LinkError::PartiallyApplied {
                operation: self.operation,
                link: self.link.clone(),
                completed: self.completed.clone(),
                source: Box::new(e),
            }),
        }
    }
}
