//! Zone History -- linear undo/redo command log for editor mutations.
//!
//! Every structural edit made through the Zone editor is recorded as a
//! reversible [`Action`] in a [`CommandLog`]. The log is a single linear
//! timeline: recording a new action after an undo discards the redoable
//! "future" entries, there is no branching history.
//!
//! The log is generic over the state it mutates. Actions receive that state
//! explicitly on every undo/redo call instead of holding references into it,
//! so an action can only carry owned snapshots of the values it restores.
//!
//! # Example
//!
//! ```
//! use zone_history::{CommandLog, FnAction};
//!
//! let mut value = 1;
//! let mut log: CommandLog<i32> = CommandLog::new();
//!
//! value = 2;
//! log.record(FnAction::new(|v: &mut i32| *v = 1, |v: &mut i32| *v = 2, "set to 2"));
//!
//! assert!(log.undo(&mut value));
//! assert_eq!(value, 1);
//! assert!(log.redo(&mut value));
//! assert_eq!(value, 2);
//! assert!(!log.can_redo());
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod log;

pub use action::{Action, FnAction};
pub use log::{CommandLog, HistoryEntry};
