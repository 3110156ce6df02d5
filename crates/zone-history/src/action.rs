//! Reversible units of work.
//!
//! An [`Action`] is a pair of inverse operations over some target state `T`
//! plus a human-readable label for history display. Concrete actions hold
//! owned copies of the identifiers and old/new values they touch, never live
//! references, so undoing after later edits still restores the original set
//! of affected items.

use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A reversible edit over a target of type `T`.
///
/// `apply_redo` must reproduce exactly the state that existed immediately
/// before the last `apply_undo`. The [`CommandLog`](crate::CommandLog) calls
/// each side exactly once per transition.
pub trait Action<T> {
    /// Restore the state that existed before the action was performed.
    fn apply_undo(&mut self, target: &mut T);

    /// Re-apply the action after it was undone.
    fn apply_redo(&mut self, target: &mut T);

    /// Description shown in history and menu labels.
    fn label(&self) -> &str;
}

// ---------------------------------------------------------------------------
// FnAction
// ---------------------------------------------------------------------------

type Step<T> = Box<dyn FnMut(&mut T)>;

/// An [`Action`] built from a pair of closures.
///
/// Useful for one-off edits that do not warrant a dedicated type. The
/// closures should capture owned snapshots only.
pub struct FnAction<T> {
    undo: Step<T>,
    redo: Step<T>,
    label: String,
}

impl<T> FnAction<T> {
    /// Build an action from its undo and redo steps.
    pub fn new<U, R>(undo: U, redo: R, label: impl Into<String>) -> Self
    where
        U: FnMut(&mut T) + 'static,
        R: FnMut(&mut T) + 'static,
    {
        Self {
            undo: Box::new(undo),
            redo: Box::new(redo),
            label: label.into(),
        }
    }
}

impl<T> Action<T> for FnAction<T> {
    fn apply_undo(&mut self, target: &mut T) {
        (self.undo)(target);
    }

    fn apply_redo(&mut self, target: &mut T) {
        (self.redo)(target);
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl<T> fmt::Debug for FnAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_action_runs_the_matching_step() {
        let mut action = FnAction::new(
            |v: &mut Vec<String>| v.push("undo".to_owned()),
            |v: &mut Vec<String>| v.push("redo".to_owned()),
            "push",
        );
        let mut calls = Vec::new();

        action.apply_undo(&mut calls);
        action.apply_redo(&mut calls);

        assert_eq!(calls, vec!["undo", "redo"]);
        assert_eq!(action.label(), "push");
    }

    #[test]
    fn fn_action_debug_shows_label() {
        let action = FnAction::new(|_: &mut ()| {}, |_: &mut ()| {}, "noop");
        assert!(format!("{action:?}").contains("noop"));
    }
}
