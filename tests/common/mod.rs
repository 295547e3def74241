//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use studia_core::{
    properties::{Dependency, Lesson, LessonDraft, LessonId, LessonMove, PlanId, RelationId},
    save::PlanRemote,
    StudiaError,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// One recorded remote invocation, in arrival order.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum RemoteCall {
    AddLesson(PlanId, LessonId),
    BatchMove(PlanId, Vec<LessonMove>),
    RemoveLesson(PlanId, LessonId),
    AddDependency(PlanId, LessonId, LessonId),
    RemoveDependency(PlanId, LessonId, RelationId),
    DeleteLesson(PlanId, LessonId),
    DeleteDependency(PlanId, LessonId, RelationId),
}

impl RemoteCall {
    pub fn label(&self) -> &'static str {
        match self {
            RemoteCall::AddLesson(_, _) => "add_lesson",
            RemoteCall::BatchMove(_, _) => "batch_move",
            RemoteCall::RemoveLesson(_, _) => "remove_lesson",
            RemoteCall::AddDependency(_, _, _) => "add_dependency",
            RemoteCall::RemoveDependency(_, _, _) => "remove_dependency",
            RemoteCall::DeleteLesson(_, _) => "delete_lesson",
            RemoteCall::DeleteDependency(_, _, _) => "delete_dependency",
        }
    }
}

/// Mock [`PlanRemote`] that records every call and can be told to fail
/// specific operations with a given error.
#[derive(Default)]
pub struct RecordingRemote {
    calls: Mutex<Vec<RemoteCall>>,
    failures: Mutex<BTreeMap<&'static str, StudiaError>>,
    next_relation_id: AtomicI64,
}

#[allow(dead_code)]
impl RecordingRemote {
    pub fn new() -> Self {
        RecordingRemote::default()
    }

    /// Make every subsequent call to the named operation fail with `error`.
    pub fn fail_with(&self, operation: &'static str, error: StudiaError) {
        self.failures.lock().insert(operation, error);
    }

    /// Let the named operation succeed again.
    pub fn heal(&self, operation: &'static str) {
        self.failures.lock().remove(operation);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// The operation names invoked so far, in order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(RemoteCall::label).collect()
    }

    fn record(&self, call: RemoteCall) -> Result<(), StudiaError> {
        let label = call.label();
        self.calls.lock().push(call);
        match self.failures.lock().get(label) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlanRemote for RecordingRemote {
    async fn add_lesson(&self, plan: PlanId, draft: LessonDraft) -> Result<Lesson, StudiaError> {
        self.record(RemoteCall::AddLesson(plan, draft.lesson))?;
        Ok(Lesson {
            id: draft.lesson,
            title: format!("lesson {}", draft.lesson.0),
            position: draft.position,
        })
    }

    async fn remove_lesson(&self, plan: PlanId, lesson: LessonId) -> Result<(), StudiaError> {
        self.record(RemoteCall::RemoveLesson(plan, lesson))
    }

    async fn batch_move(&self, plan: PlanId, moves: Vec<LessonMove>) -> Result<(), StudiaError> {
        self.record(RemoteCall::BatchMove(plan, moves))
    }

    async fn add_dependency(
        &self,
        plan: PlanId,
        from: LessonId,
        to: LessonId,
    ) -> Result<Dependency, StudiaError> {
        self.record(RemoteCall::AddDependency(plan, from, to))?;
        Ok(Dependency {
            id: RelationId(self.next_relation_id.fetch_add(1, Ordering::SeqCst) + 1000),
            from,
            to,
        })
    }

    async fn remove_dependency(
        &self,
        plan: PlanId,
        from: LessonId,
        relation: RelationId,
    ) -> Result<(), StudiaError> {
        self.record(RemoteCall::RemoveDependency(plan, from, relation))
    }

    async fn delete_lesson(&self, plan: PlanId, lesson: LessonId) -> Result<(), StudiaError> {
        self.record(RemoteCall::DeleteLesson(plan, lesson))
    }

    async fn delete_dependency(
        &self,
        plan: PlanId,
        from: LessonId,
        relation: RelationId,
    ) -> Result<(), StudiaError> {
        self.record(RemoteCall::DeleteDependency(plan, from, relation))
    }
}
