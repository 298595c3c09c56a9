use crate::evaluator::Evaluator;

/// What a consumer should do with a guarded affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// Render and enable it.
    Shown,
    /// Hide or disable it.
    Hidden,
}

/// Declarative `(resource, action)` requirement attached to a UI element or
/// route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guard {
    resource: String,
    action: String,
}

impl Guard {
    /// Creates a guard requiring `action` on `resource`.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Required resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Required action.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns whether the session behind `evaluator` passes this guard.
    pub fn allows<S>(&self, evaluator: &Evaluator<S>) -> bool {
        evaluator.check(&self.resource, &self.action)
    }

    /// Maps [`Guard::allows`] onto show or hide.
    pub fn affordance<S>(&self, evaluator: &Evaluator<S>) -> Affordance {
        if self.allows(evaluator) {
            Affordance::Shown
        } else {
            Affordance::Hidden
        }
    }
}
