//! Shared test utilities for session and cache testing

use crate::{
    properties::{Lesson, LessonId, Position, RelationId},
    session::EditSession,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Helper function to create a simple Lesson for testing
pub fn create_test_lesson(id: i64, title: &str) -> Lesson {
    Lesson {
        id: LessonId(id),
        title: title.to_string(),
        position: None,
    }
}

/// A session with one staged change in each of the five collections.
pub fn create_staged_session() -> EditSession {
    init_logging();

    let mut session = EditSession::new();
    session.add_lesson(LessonId(10), Some(Position::new(10.0, 20.0)));
    session.move_lesson(LessonId(1), 500.0, 600.0);
    session.remove_lesson(LessonId(102));
    session.add_dependency(LessonId(1), LessonId(10));
    session.remove_dependency(LessonId(2), RelationId(77));
    session
}
