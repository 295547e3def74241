//! Graph data structures for the server-confirmed view of a plan.
//!
//! This module provides the confirmed counterpart to the staged
//! [`EditSession`](crate::session::EditSession):
//! - [`DepGraph`]: owned dependency multigraph with [`RelationId`] edges
//! - [`PlanGraph`]: lessons plus relations for one plan, kept in sync by
//!   applying [`PlanEvent`]s

use crate::{
    event::{EventOrigin, PlanEvent},
    properties::{Dependency, Lesson, LessonId, PlanId, RelationId},
};
use petgraph::{
    graphmap::GraphMap,
    visit::{depth_first_search, DfsEvent},
    Directed, IntoWeightedEdge,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type LessonSubGraph = GraphMap<LessonId, (), Directed>;

/// Dependency edges between lessons. A `petgraph::Graph` rather than a map
/// keyed by endpoints: structurally identical `(from, to)` pairs may coexist
/// as distinct relation records, and each edge carries its own id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepGraph(pub petgraph::Graph<LessonId, RelationId>);

impl Default for DepGraph {
    fn default() -> Self {
        DepGraph(petgraph::Graph::new())
    }
}

impl DepGraph {
    pub fn as_graph(&self) -> &petgraph::Graph<LessonId, RelationId> {
        &self.0
    }

    pub fn as_graph_mut(&mut self) -> &mut petgraph::Graph<LessonId, RelationId> {
        &mut self.0
    }

    pub fn from_edges<I>(iterable: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoWeightedEdge<RelationId, NodeId = LessonId>,
    {
        let mut graph = petgraph::Graph::new();
        let mut lesson_to_index = BTreeMap::new();
        let edges = iterable
            .into_iter()
            .map(|edge| edge.into_weighted_edge())
            .collect::<Vec<(LessonId, LessonId, RelationId)>>();

        for (source, sink, _) in edges.iter() {
            for lesson in [source, sink] {
                if !lesson_to_index.contains_key(lesson) {
                    let index = graph.add_node(*lesson);
                    lesson_to_index.insert(*lesson, index);
                }
            }
        }

        for (source, sink, relation) in edges {
            let source_idx = lesson_to_index[&source];
            let sink_idx = lesson_to_index[&sink];
            graph.add_edge(source_idx, sink_idx, relation);
        }

        DepGraph(graph)
    }

    pub fn add_dependency(&mut self, dependency: &Dependency) {
        let from = self.index_of_or_insert(dependency.from);
        let to = self.index_of_or_insert(dependency.to);
        self.0.add_edge(from, to, dependency.id);
    }

    pub fn contains(&self, relation: RelationId) -> bool {
        self.0.edge_weights().any(|id| *id == relation)
    }

    pub fn retain<F: FnMut(&LessonId, &LessonId, &RelationId) -> bool>(&mut self, mut f: F) {
        let to_remove = self
            .as_graph()
            .edge_indices()
            .filter(|edge_idx| {
                if let Some((source_idx, sink_idx)) = self.as_graph().edge_endpoints(*edge_idx) {
                    let source = self.as_graph()[source_idx];
                    let sink = self.as_graph()[sink_idx];
                    let relation = &self.as_graph()[*edge_idx];
                    !f(&source, &sink, relation)
                } else {
                    false
                }
            })
            .collect::<Vec<_>>();

        for edge_idx in to_remove {
            self.as_graph_mut().remove_edge(edge_idx);
        }
    }

    /// Collapse the multigraph into a traversal map. Parallel edges merge;
    /// that is fine for reachability questions.
    pub fn as_subgraph(&self, reverse: bool) -> LessonSubGraph {
        let edges = self.as_graph().raw_edges().iter().map(|edge| {
            let source = self.as_graph()[edge.source()];
            let sink = self.as_graph()[edge.target()];
            if reverse {
                (sink, source)
            } else {
                (source, sink)
            }
        });
        LessonSubGraph::from_edges(edges)
    }

    fn index_of_or_insert(&mut self, lesson: LessonId) -> petgraph::graph::NodeIndex {
        self.0
            .node_indices()
            .find(|idx| self.0[*idx] == lesson)
            .unwrap_or_else(|| self.0.add_node(lesson))
    }
}

/// The server-confirmed state of one plan: lessons and the dependency graph
/// between them.
///
/// The edit surface stages changes against this snapshot in an
/// [`EditSession`](crate::session::EditSession); push events keep the
/// snapshot current between saves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanGraph {
    pub plan: PlanId,
    pub lessons: BTreeMap<LessonId, Lesson>,
    pub relations: DepGraph,
}

impl PlanGraph {
    pub fn new(plan: PlanId) -> Self {
        PlanGraph {
            plan,
            lessons: BTreeMap::new(),
            relations: DepGraph::default(),
        }
    }

    /// Build the snapshot from a fetched plan payload: the lesson records and
    /// the full dependency list, as returned by the plan detail endpoint.
    pub fn from_snapshot<L, D>(plan: PlanId, lessons: L, relations: D) -> Self
    where
        L: IntoIterator<Item = Lesson>,
        D: IntoIterator<Item = Dependency>,
    {
        PlanGraph {
            plan,
            lessons: lessons
                .into_iter()
                .map(|lesson| (lesson.id, lesson))
                .collect(),
            relations: DepGraph::from_edges(relations),
        }
    }

    /// Apply a push event to this snapshot.
    ///
    /// [`EventOrigin::Local`] events were already applied by the surface that
    /// generated them and are skipped; events for other plans are ignored.
    pub fn apply_event(&mut self, event: &PlanEvent) {
        if event.origin() == Some(EventOrigin::Local) {
            return;
        }
        match event {
            PlanEvent::LessonAdded(plan, lesson, _) if *plan == self.plan => {
                self.lessons.insert(lesson.id, lesson.clone());
            }
            PlanEvent::LessonsRemoved(plan, removed, _) if *plan == self.plan => {
                for lesson in removed {
                    self.lessons.remove(lesson);
                }
                let kept: BTreeSet<LessonId> = self.lessons.keys().copied().collect();
                self.relations
                    .retain(|source, sink, _| kept.contains(source) && kept.contains(sink));
            }
            PlanEvent::LessonsMoved(plan, moves, _) if *plan == self.plan => {
                for entry in moves {
                    if let Some(lesson) = self.lessons.get_mut(&entry.lesson) {
                        lesson.position = Some(entry.position);
                    }
                }
            }
            PlanEvent::DependencyAdded(plan, dependency, _) if *plan == self.plan => {
                if !self.relations.contains(dependency.id) {
                    self.relations.add_dependency(dependency);
                }
            }
            PlanEvent::DependenciesRemoved(plan, removed, _) if *plan == self.plan => {
                self.relations
                    .retain(|_, _, relation| !removed.contains(relation));
            }
            _ => {}
        }
    }

    /// All lessons that must be completed before `lesson` unlocks
    /// (transitive incoming closure, excluding `lesson` itself).
    pub fn prerequisites_of(&self, lesson: LessonId) -> BTreeSet<LessonId> {
        let mut closure = self.reachable(lesson, true);
        closure.remove(&lesson);
        closure
    }

    /// All lessons that `lesson` transitively unlocks.
    pub fn unlocked_by(&self, lesson: LessonId) -> BTreeSet<LessonId> {
        let mut closure = self.reachable(lesson, false);
        closure.remove(&lesson);
        closure
    }

    /// Whether adding a dependency `from -> to` would close a cycle in the
    /// confirmed graph. The edit surface consults this before staging a
    /// dependency addition.
    pub fn would_create_cycle(&self, from: LessonId, to: LessonId) -> bool {
        if from == to {
            return true;
        }
        self.reachable(to, false).contains(&from)
    }

    fn reachable(&self, start: LessonId, reverse: bool) -> BTreeSet<LessonId> {
        let subgraph = self.relations.as_subgraph(reverse);
        let mut reached = BTreeSet::new();
        if subgraph.contains_node(start) {
            depth_first_search(&subgraph, Some(start), |event| {
                if let DfsEvent::Discover(lesson, _) = event {
                    reached.insert(lesson);
                }
            });
        }
        reached
    }
}
