/// [crate::properties] contains the basic building blocks shared by the edit
/// session, saver, reconciliation, and graph modules: stable identifiers,
/// staged positions, and the record types exchanged with the remote plan API.
use petgraph::IntoWeightedEdge;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub use uuid::Uuid;

// Use `Uuid` as a custom type, with `String` as the Builtin
uniffi::custom_type!(Uuid, String, {
    remote,
    try_lift: |val| Ok(Uuid::try_from(val)?),
    lower: |obj| format!(
        "{}",
        obj.hyphenated().encode_lower(&mut Uuid::encode_buffer())
    )
});

/// Server-assigned identifier of a lesson record.
///
/// Lessons are canonical records owned by the backend; a plan references them
/// as graph nodes. The id space is the backend's primary-key space, so ids are
/// only meaningful once the server has confirmed the record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LessonId(pub i64);

uniffi::custom_newtype!(LessonId, i64);

impl Display for LessonId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "lesson:{}", self.0)
    }
}

/// Server-assigned identifier of a dependency relation between two lessons.
///
/// Structurally identical `(from, to)` pairs may coexist as distinct relation
/// records, so relations carry their own identity rather than being keyed by
/// their endpoints.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelationId(pub i64);

uniffi::custom_newtype!(RelationId, i64);

impl Display for RelationId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "relation:{}", self.0)
    }
}

/// Server-assigned identifier of a study plan, the parent resource every edit
/// session is anchored to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlanId(pub i64);

uniffi::custom_newtype!(PlanId, i64);

impl Display for PlanId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "plan:{}", self.0)
    }
}

/// A 2D canvas position for a lesson node within a plan's graph view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One entry of a batched position flush.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct LessonMove {
    pub lesson: LessonId,
    pub position: Position,
}

/// Draft payload for staging a lesson addition against a plan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct LessonDraft {
    pub lesson: LessonId,
    pub position: Option<Position>,
}

/// Identity of a record that may not yet be server-confirmed.
///
/// Negative-id sentinels would overload the server's id space with a magic
/// convention, so placeholders carry an explicit client-generated tag
/// instead. A record is either [`Local`]
/// (awaiting confirmation) or [`Confirmed`] (server-assigned identity); the
/// two never collide.
///
/// [`Local`]: EntryId::Local
/// [`Confirmed`]: EntryId::Confirmed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryId {
    /// A client-side placeholder tag, assigned when the record is appended
    /// locally and retired once the server confirms it.
    Local(Uuid),
    /// The server-assigned identity.
    Confirmed(i64),
}

impl EntryId {
    /// Mint a fresh placeholder tag.
    pub fn local() -> Self {
        EntryId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, EntryId::Local(_))
    }

    /// The server-assigned id, if this entry has one.
    pub fn confirmed(&self) -> Option<i64> {
        match self {
            EntryId::Local(_) => None,
            EntryId::Confirmed(id) => Some(*id),
        }
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            EntryId::Local(tag) => write!(f, "local:{tag}"),
            EntryId::Confirmed(id) => write!(f, "{id}"),
        }
    }
}

/// A lesson node as confirmed by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    /// Canvas position within the owning plan, when the plan's graph view has
    /// laid the lesson out.
    pub position: Option<Position>,
}

/// A dependency edge between two lessons within a plan. `from` must be
/// completed before `to` unlocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: RelationId,
    pub from: LessonId,
    pub to: LessonId,
}

impl IntoWeightedEdge<RelationId> for Dependency {
    type NodeId = LessonId;

    fn into_weighted_edge(self) -> (Self::NodeId, Self::NodeId, RelationId) {
        (self.from, self.to, self.id)
    }
}

/// Key identifying a staged relation removal.
///
/// The origin lesson rides along with the relation id because the remote
/// removal endpoint is scoped by the relation's `from` endpoint.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyKey {
    pub from: LessonId,
    pub relation: RelationId,
}

/// A chat/thread message record, the canonical example of a reconciling
/// append list: appended locally as a placeholder, then confirmed (or
/// superseded by a push event) by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: EntryId,
    pub thread: i64,
    pub body: String,
    /// Unix epoch milliseconds; placeholder messages carry the client clock
    /// until the server's timestamp replaces it.
    pub sent_at_ms: i64,
}

impl ChatMessage {
    /// Build a placeholder message awaiting server confirmation.
    pub fn placeholder(thread: i64, body: impl Into<String>, sent_at_ms: i64) -> Self {
        ChatMessage {
            id: EntryId::local(),
            thread,
            body: body.into(),
            sent_at_ms,
        }
    }
}
