use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    cache::CacheKey,
    error::StudiaError,
    properties::{ChatMessage, Dependency, Lesson, LessonId, LessonMove, PlanId, RelationId},
};

/// Indicates the origin of a PlanEvent for proper handling by the different
/// cache layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventOrigin {
    /// Event was generated locally and has already been applied to the
    /// originating surface's state. The originator should skip reapplication;
    /// other caches (confirmed graph, message lists) should apply it.
    Local,

    /// Event came from an external source (push channel, another client).
    /// Local state must apply these events to synchronize.
    #[default]
    Remote,
}

/// Out-of-band notifications about server-owned resources.
///
/// Events and direct call responses can arrive in either order; consumers
/// (the confirmed graph, reconciling message lists) are written so the final
/// state is the same regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    LessonAdded(PlanId, Lesson, EventOrigin),
    LessonsRemoved(PlanId, Vec<LessonId>, EventOrigin),
    LessonsMoved(PlanId, Vec<LessonMove>, EventOrigin),
    DependencyAdded(PlanId, Dependency, EventOrigin),
    DependenciesRemoved(PlanId, Vec<RelationId>, EventOrigin),
    /// Thread id, message record
    MessagePosted(i64, ChatMessage, EventOrigin),
    /// Keep-alive from the push channel.
    Ping,
}

impl PlanEvent {
    /// Returns the EventOrigin of this event, or None for Ping
    pub fn origin(&self) -> Option<EventOrigin> {
        match self {
            PlanEvent::LessonAdded(_, _, origin) => Some(*origin),
            PlanEvent::LessonsRemoved(_, _, origin) => Some(*origin),
            PlanEvent::LessonsMoved(_, _, origin) => Some(*origin),
            PlanEvent::DependencyAdded(_, _, origin) => Some(*origin),
            PlanEvent::DependenciesRemoved(_, _, origin) => Some(*origin),
            PlanEvent::MessagePosted(_, _, origin) => Some(*origin),
            PlanEvent::Ping => None,
        }
    }

    /// Returns a new event with the specified origin
    pub fn with_origin(self, new_origin: EventOrigin) -> Self {
        match self {
            PlanEvent::LessonAdded(p, l, _) => PlanEvent::LessonAdded(p, l, new_origin),
            PlanEvent::LessonsRemoved(p, l, _) => PlanEvent::LessonsRemoved(p, l, new_origin),
            PlanEvent::LessonsMoved(p, m, _) => PlanEvent::LessonsMoved(p, m, new_origin),
            PlanEvent::DependencyAdded(p, d, _) => PlanEvent::DependencyAdded(p, d, new_origin),
            PlanEvent::DependenciesRemoved(p, r, _) => {
                PlanEvent::DependenciesRemoved(p, r, new_origin)
            }
            PlanEvent::MessagePosted(t, m, _) => PlanEvent::MessagePosted(t, m, new_origin),
            PlanEvent::Ping => PlanEvent::Ping,
        }
    }

    /// The cache scope this event invalidates, if any. Scopes are the first
    /// key segment of the keyed resource cache, so eviction stays bounded to
    /// the resource family the event concerns.
    pub fn cache_scope(&self) -> Option<CacheKey> {
        match self {
            PlanEvent::LessonAdded(plan, _, _)
            | PlanEvent::LessonsRemoved(plan, _, _)
            | PlanEvent::LessonsMoved(plan, _, _)
            | PlanEvent::DependencyAdded(plan, _, _)
            | PlanEvent::DependenciesRemoved(plan, _, _) => {
                Some(CacheKey::new(["plans".to_string(), plan.0.to_string()]))
            }
            PlanEvent::MessagePosted(thread, _, _) => {
                Some(CacheKey::new(["chat".to_string(), thread.to_string()]))
            }
            PlanEvent::Ping => None,
        }
    }
}

/// Transmit side of the push-event channel wiring surfaces to their
/// downstream consumers (confirmed graphs, message lists, cache eviction).
///
/// Surfaces that mutated state directly publish their events tagged
/// [`EventOrigin::Local`] via [`with_origin`](PlanEvent::with_origin) so
/// consumers can skip reapplying what the originator already applied.
#[derive(Debug, Clone)]
pub struct PlanEventSender {
    tx: UnboundedSender<PlanEvent>,
}

impl PlanEventSender {
    /// Create the channel; the receive side is handed to the consumer loop.
    pub fn channel() -> (PlanEventSender, UnboundedReceiver<PlanEvent>) {
        let (tx, rx) = unbounded_channel();
        (PlanEventSender { tx }, rx)
    }

    /// Publish an event. Fails once the receive side has been dropped.
    pub fn send(&self, event: PlanEvent) -> Result<(), StudiaError> {
        self.tx.send(event)?;
        Ok(())
    }
}

impl Display for PlanEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            PlanEvent::LessonAdded(_, _, _) => write!(f, "LessonAdded"),
            PlanEvent::LessonsRemoved(_, _, _) => write!(f, "LessonsRemoved"),
            PlanEvent::LessonsMoved(_, _, _) => write!(f, "LessonsMoved"),
            PlanEvent::DependencyAdded(_, _, _) => write!(f, "DependencyAdded"),
            PlanEvent::DependenciesRemoved(_, _, _) => write!(f, "DependenciesRemoved"),
            PlanEvent::MessagePosted(_, _, _) => write!(f, "MessagePosted"),
            PlanEvent::Ping => write!(f, "Ping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_delivers_events_in_order() {
        let (tx, mut rx) = PlanEventSender::channel();
        tx.send(PlanEvent::Ping).unwrap();
        tx.send(PlanEvent::LessonsRemoved(
            PlanId(42),
            vec![LessonId(1)],
            EventOrigin::Remote,
        ))
        .unwrap();

        assert_eq!(rx.recv().await, Some(PlanEvent::Ping));
        assert_eq!(
            rx.recv().await,
            Some(PlanEvent::LessonsRemoved(
                PlanId(42),
                vec![LessonId(1)],
                EventOrigin::Remote,
            ))
        );
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_surfaces_an_error() {
        let (tx, rx) = PlanEventSender::channel();
        drop(rx);
        let err = tx.send(PlanEvent::Ping).unwrap_err();
        assert!(matches!(err, StudiaError::Io(_)));
    }
}
