//! Client-staged edit sessions for server-owned plan graphs.
//!
//! An [`EditSession`] accumulates not-yet-persisted changes to one plan:
//! staged lesson additions and removals, staged position moves, and staged
//! dependency additions and removals. Every mutating call records an
//! invertible command on the undo stack, so a session supports full
//! undo/redo until the accumulated diff is flushed by
//! [`save_session`](crate::save::save_session) or discarded.
//!
//! No network calls happen here; the session is pure client-side state with a
//! single logical owner (the edit surface that created it).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::properties::{DependencyKey, LessonId, Position, RelationId};

/// One atomic, invertible user action recorded on the undo/redo stacks.
///
/// Each command touches exactly one staged collection and captures that
/// collection's prior entry for the touched key. Undo therefore restores the
/// exact pre-call state of the session rather than a recomputed
/// approximation, and a rapid sequence of moves of the same lesson unwinds
/// one staged position at a time back to "unset".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionCommand {
    AddLesson {
        lesson: LessonId,
        position: Option<Position>,
        /// Prior staged entry for this lesson: `None` if the lesson was not
        /// staged for addition, `Some(p)` if it was (with its position).
        prior: Option<Option<Position>>,
    },
    RemoveLesson {
        lesson: LessonId,
        /// Whether the lesson was already staged for removal before the call.
        was_staged: bool,
    },
    MoveLesson {
        lesson: LessonId,
        position: Position,
        /// The previous staged position, or `None` if this was the first move
        /// of the lesson in this session.
        prior: Option<Position>,
    },
    AddDependency {
        from: LessonId,
        to: LessonId,
    },
    RemoveDependency {
        key: DependencyKey,
        was_staged: bool,
    },
}

/// The pending diff against one server-owned plan, plus undo/redo stacks.
///
/// Lifecycle: created empty when an edit surface opens a plan; cleared by
/// [`reset`](EditSession::reset) after a successful save or by
/// [`cancel`](EditSession::cancel) when the user discards edits; dropped when
/// the plan selection changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditSession {
    /// Last staged position per lesson; repeated moves overwrite.
    moved: BTreeMap<LessonId, Position>,
    /// Lessons staged for addition, each optionally carrying a position.
    added: BTreeMap<LessonId, Option<Position>>,
    /// Lessons staged for removal (detach from this plan).
    removed: BTreeSet<LessonId>,
    /// Staged dependency additions in insertion order. Duplicates are
    /// permitted: structurally identical pairs are distinct relation intents,
    /// so this is a sequence, not a set.
    added_relations: Vec<(LessonId, LessonId)>,
    /// Staged dependency removals.
    removed_relations: BTreeSet<DependencyKey>,
    /// Most recent action first.
    undo_stack: Vec<SessionCommand>,
    redo_stack: Vec<SessionCommand>,
}

impl EditSession {
    pub fn new() -> Self {
        EditSession::default()
    }

    /// Stage a lesson addition. Re-adding a lesson already staged overwrites
    /// its staged position.
    pub fn add_lesson(&mut self, lesson: LessonId, position: Option<Position>) {
        let prior = self.added.insert(lesson, position);
        self.push_command(SessionCommand::AddLesson {
            lesson,
            position,
            prior,
        });
    }

    /// Stage a lesson removal.
    pub fn remove_lesson(&mut self, lesson: LessonId) {
        let was_staged = !self.removed.insert(lesson);
        self.push_command(SessionCommand::RemoveLesson { lesson, was_staged });
    }

    /// Stage a position move. Last write wins for repeated moves of the same
    /// lesson; each move remains individually undoable.
    pub fn move_lesson(&mut self, lesson: LessonId, x: f64, y: f64) {
        let position = Position::new(x, y);
        let prior = self.moved.insert(lesson, position);
        self.push_command(SessionCommand::MoveLesson {
            lesson,
            position,
            prior,
        });
    }

    /// Stage a dependency addition from `from` to `to`.
    pub fn add_dependency(&mut self, from: LessonId, to: LessonId) {
        self.added_relations.push((from, to));
        self.push_command(SessionCommand::AddDependency { from, to });
    }

    /// Stage a dependency removal. The relation's origin lesson is tracked
    /// alongside the relation id because the remote removal endpoint is
    /// scoped by it.
    pub fn remove_dependency(&mut self, from: LessonId, relation: RelationId) {
        let key = DependencyKey { from, relation };
        let was_staged = !self.removed_relations.insert(key);
        self.push_command(SessionCommand::RemoveDependency { key, was_staged });
    }

    /// Revert the most recent action. No-op on an empty undo stack.
    pub fn undo(&mut self) {
        let Some(command) = self.undo_stack.pop() else {
            return;
        };
        tracing::debug!(?command, "undo");
        self.apply_inverse(&command);
        self.redo_stack.push(command);
    }

    /// Replay the most recently undone action. No-op on an empty redo stack.
    pub fn redo(&mut self) {
        let Some(command) = self.redo_stack.pop() else {
            return;
        };
        tracing::debug!(?command, "redo");
        self.apply_forward(&command);
        self.undo_stack.push(command);
    }

    /// Discard all staged changes and both stacks.
    pub fn cancel(&mut self) {
        tracing::debug!("edit session cancelled");
        self.reset();
    }

    /// Clear all five staged collections and both stacks unconditionally.
    /// Called after a successful save: a save is a checkpoint, not an
    /// undoable action.
    pub fn reset(&mut self) {
        self.moved.clear();
        self.added.clear();
        self.removed.clear();
        self.added_relations.clear();
        self.removed_relations.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn has_pending_changes(&self) -> bool {
        !(self.moved.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.added_relations.is_empty()
            && self.removed_relations.is_empty())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn staged_moves(&self) -> &BTreeMap<LessonId, Position> {
        &self.moved
    }

    pub fn staged_additions(&self) -> &BTreeMap<LessonId, Option<Position>> {
        &self.added
    }

    pub fn staged_removals(&self) -> &BTreeSet<LessonId> {
        &self.removed
    }

    pub fn staged_relation_additions(&self) -> &[(LessonId, LessonId)] {
        &self.added_relations
    }

    pub fn staged_relation_removals(&self) -> &BTreeSet<DependencyKey> {
        &self.removed_relations
    }

    fn push_command(&mut self, command: SessionCommand) {
        // A new action invalidates the redo branch.
        self.redo_stack.clear();
        self.undo_stack.push(command);
    }

    fn apply_forward(&mut self, command: &SessionCommand) {
        match command {
            SessionCommand::AddLesson {
                lesson, position, ..
            } => {
                self.added.insert(*lesson, *position);
            }
            SessionCommand::RemoveLesson { lesson, .. } => {
                self.removed.insert(*lesson);
            }
            SessionCommand::MoveLesson {
                lesson, position, ..
            } => {
                self.moved.insert(*lesson, *position);
            }
            SessionCommand::AddDependency { from, to } => {
                self.added_relations.push((*from, *to));
            }
            SessionCommand::RemoveDependency { key, .. } => {
                self.removed_relations.insert(*key);
            }
        }
    }

    fn apply_inverse(&mut self, command: &SessionCommand) {
        match command {
            SessionCommand::AddLesson { lesson, prior, .. } => match prior {
                Some(position) => {
                    self.added.insert(*lesson, *position);
                }
                None => {
                    self.added.remove(lesson);
                }
            },
            SessionCommand::RemoveLesson { lesson, was_staged } => {
                if !was_staged {
                    self.removed.remove(lesson);
                }
            }
            SessionCommand::MoveLesson { lesson, prior, .. } => match prior {
                Some(position) => {
                    self.moved.insert(*lesson, *position);
                }
                None => {
                    self.moved.remove(lesson);
                }
            },
            SessionCommand::AddDependency { .. } => {
                // Stack discipline: every later append has already been
                // undone by the time this command unwinds, so the staged pair
                // is the final element.
                self.added_relations.pop();
            }
            SessionCommand::RemoveDependency { key, was_staged } => {
                if !was_staged {
                    self.removed_relations.remove(key);
                }
            }
        }
    }
}
