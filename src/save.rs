//! Flattening a staged [`EditSession`] into the minimal ordered set of
//! remote calls, plus the immediate (non-staged) canonical delete operations.

use async_trait::async_trait;

use crate::{
    error::{StudiaError, UiErrorKind},
    properties::{Dependency, Lesson, LessonDraft, LessonId, LessonMove, PlanId, RelationId},
    session::EditSession,
};

/// The remote plan API the saver flushes against.
///
/// Implementations wrap the platform's HTTP client; errors are expected to be
/// plain message-text errors with embedded HTTP-like markers ("401", "403",
/// "404", "400") that [`classify_message`](crate::error::classify_message)
/// and [`classify_ui_message`](crate::error::classify_ui_message) both parse.
///
/// `remove_lesson`/`remove_dependency` detach a record from the given plan
/// only. `delete_lesson`/`delete_dependency` remove the canonical record and
/// may be rejected with a validation error when the record is shared across
/// other plans.
#[async_trait]
pub trait PlanRemote: Send + Sync {
    async fn add_lesson(&self, plan: PlanId, draft: LessonDraft) -> Result<Lesson, StudiaError>;

    async fn remove_lesson(&self, plan: PlanId, lesson: LessonId) -> Result<(), StudiaError>;

    /// Flush all staged positions in one call, never N individual moves.
    async fn batch_move(&self, plan: PlanId, moves: Vec<LessonMove>) -> Result<(), StudiaError>;

    async fn add_dependency(
        &self,
        plan: PlanId,
        from: LessonId,
        to: LessonId,
    ) -> Result<Dependency, StudiaError>;

    /// Removal is scoped by the relation's origin lesson, mirroring the
    /// remote endpoint shape.
    async fn remove_dependency(
        &self,
        plan: PlanId,
        from: LessonId,
        relation: RelationId,
    ) -> Result<(), StudiaError>;

    async fn delete_lesson(&self, plan: PlanId, lesson: LessonId) -> Result<(), StudiaError>;

    async fn delete_dependency(
        &self,
        plan: PlanId,
        from: LessonId,
        relation: RelationId,
    ) -> Result<(), StudiaError>;
}

/// Flush the session's accumulated diff to the remote API and reset the
/// session on full success.
///
/// Phase order: staged additions first (so later relation adds can reference
/// them), then one batched position flush, then lesson removals, then
/// relation additions in insertion order, then relation removals. Within a
/// phase, calls follow the collection's iteration order.
///
/// With no selected plan (`plan == None`) the save resolves immediately
/// without touching the remote.
///
/// On the first failure the error is surfaced and the session is left
/// un-reset so the user can retry. Already-flushed calls are NOT rolled back;
/// the remote API offers no transaction primitive, so retries have
/// at-least-once semantics and callers must tolerate repeated sub-steps.
pub async fn save_session(
    session: &mut EditSession,
    plan: Option<PlanId>,
    remote: &dyn PlanRemote,
) -> Result<(), StudiaError> {
    let Some(plan) = plan else {
        tracing::debug!("no plan selected, save is a no-op");
        return Ok(());
    };

    let additions: Vec<LessonDraft> = session
        .staged_additions()
        .iter()
        .map(|(lesson, position)| LessonDraft {
            lesson: *lesson,
            position: *position,
        })
        .collect();
    let moves: Vec<LessonMove> = session
        .staged_moves()
        .iter()
        .map(|(lesson, position)| LessonMove {
            lesson: *lesson,
            position: *position,
        })
        .collect();
    let removals: Vec<LessonId> = session.staged_removals().iter().copied().collect();
    let relation_additions = session.staged_relation_additions().to_vec();
    let relation_removals: Vec<_> = session.staged_relation_removals().iter().copied().collect();

    tracing::debug!(
        %plan,
        additions = additions.len(),
        moves = moves.len(),
        removals = removals.len(),
        relation_additions = relation_additions.len(),
        relation_removals = relation_removals.len(),
        "flushing edit session"
    );

    for draft in additions {
        remote.add_lesson(plan, draft).await?;
    }
    if !moves.is_empty() {
        remote.batch_move(plan, moves).await?;
    }
    for lesson in removals {
        remote.remove_lesson(plan, lesson).await?;
    }
    for (from, to) in relation_additions {
        remote.add_dependency(plan, from, to).await?;
    }
    for key in relation_removals {
        remote.remove_dependency(plan, key.from, key.relation).await?;
    }

    session.reset();
    tracing::debug!(%plan, "edit session flushed and reset");
    Ok(())
}

/// Immediate canonical deletes with an explicit error slot.
///
/// Deletes are not staged and never enter a session's undo stack: a
/// server-side delete has no client-side inverse. The error slot is cleared
/// at the start of every new attempt, so a stale error from a previous action
/// never lingers once a new attempt begins.
pub struct Deleter<R> {
    remote: R,
    last_error: Option<StudiaError>,
}

impl<R: PlanRemote> Deleter<R> {
    pub fn new(remote: R) -> Self {
        Deleter {
            remote,
            last_error: None,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The error from the most recent failed attempt, if the latest attempt
    /// failed.
    pub fn last_error(&self) -> Option<&StudiaError> {
        self.last_error.as_ref()
    }

    /// UI-facing kind of the last error. Validation failures carry the
    /// verbatim server message (including any "used in N other plans" count).
    pub fn last_error_kind(&self) -> Option<UiErrorKind> {
        self.last_error.as_ref().map(StudiaError::ui_kind)
    }

    pub async fn delete_lesson(
        &mut self,
        plan: PlanId,
        lesson: LessonId,
    ) -> Result<(), StudiaError> {
        self.last_error = None;
        match self.remote.delete_lesson(plan, lesson).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(%plan, %lesson, error = %err, "lesson delete failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn delete_dependency(
        &mut self,
        plan: PlanId,
        from: LessonId,
        relation: RelationId,
    ) -> Result<(), StudiaError> {
        self.last_error = None;
        match self.remote.delete_dependency(plan, from, relation).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(%plan, %relation, error = %err, "dependency delete failed");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}
