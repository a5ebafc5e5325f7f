//! Function wrapper produced by `DataManager::require`.

use super::{DataManager, ManagerError, Requirement};

/// A function bound to the data files it needs.
///
/// Each call resolves every requirement (downloading only what is not
/// cached), runs the function with the paths visible through
/// `DataManager::get`, and clears them again when the function returns or
/// panics.
pub struct Required<F> {
    manager: DataManager,
    requirements: Vec<Requirement>,
    f: F,
}

impl<F> Required<F> {
    pub(super) fn new(manager: DataManager, requirements: Vec<Requirement>, f: F) -> Self {
        Self {
            manager,
            requirements,
            f,
        }
    }

    /// Also require `requirement` (resolved after the existing ones).
    pub fn and_require(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Call a wrapped `Fn() -> R`.
    pub fn call<R>(&self) -> Result<R, ManagerError>
    where
        F: Fn() -> R,
    {
        self.manager
            .with_requirements(&self.requirements, || (self.f)())
    }

    /// Call a wrapped `Fn(A) -> R` with `arg`.
    pub fn call_with<A, R>(&self, arg: A) -> Result<R, ManagerError>
    where
        F: Fn(A) -> R,
    {
        self.manager
            .with_requirements(&self.requirements, move || (self.f)(arg))
    }
}
