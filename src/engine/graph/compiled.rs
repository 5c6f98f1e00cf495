//! Finalized graph and its executor

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use super::edge::{ConditionalEdge, END};
use crate::engine::error::GraphError;
use crate::engine::step::Step;

/// An immutable graph produced by
/// [`StateGraph::finalize`](super::StateGraph::finalize).
///
/// Runs are independent: each call receives its own state record and the
/// graph holds nothing mutable, so one graph can serve many threads.
///
/// There is no cycle detection. A graph whose edges form a loop with no
/// terminating branch keeps running until the caller interrupts it.
pub struct CompiledGraph<S> {
    pub(super) name: String,
    pub(super) steps: HashMap<String, Arc<dyn Step<S>>>,
    pub(super) order: Vec<String>,
    pub(super) edges: HashMap<String, String>,
    pub(super) conditional: HashMap<String, ConditionalEdge<S>>,
    pub(super) entry: String,
    pub(super) finish: BTreeSet<String>,
    pub(super) resume_points: BTreeSet<String>,
}

/// Serializable description of a graph's wiring.
///
/// Two finalizations of the same builder produce equal structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStructure {
    pub name: String,
    pub steps: Vec<String>,
    pub edges: BTreeMap<String, String>,
    pub conditional_edges: BTreeMap<String, BTreeMap<String, String>>,
    pub entry: String,
    pub finish: BTreeSet<String>,
    pub resume_points: BTreeSet<String>,
}

impl<S> CompiledGraph<S> {
    /// Name of the graph
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step the run starts from
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Whether `name` is a registered step
    pub fn contains_step(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Whether `name` is marked as a finish step
    pub fn is_finish(&self, name: &str) -> bool {
        self.finish.contains(name)
    }

    /// Whether `name` is a declared resume point
    pub fn is_resume_point(&self, name: &str) -> bool {
        self.resume_points.contains(name)
    }

    /// Describe the wiring of this graph
    pub fn structure(&self) -> GraphStructure {
        GraphStructure {
            name: self.name.clone(),
            steps: self.order.clone(),
            edges: self
                .edges
                .iter()
                .map(|(from, to)| (from.clone(), to.clone()))
                .collect(),
            conditional_edges: self
                .conditional
                .iter()
                .map(|(from, edge)| (from.clone(), edge.routes.clone()))
                .collect(),
            entry: self.entry.clone(),
            finish: self.finish.clone(),
            resume_points: self.resume_points.clone(),
        }
    }

    /// Run the graph from the entry step
    pub fn run(&self, state: S) -> Result<S, GraphError> {
        self.run_from(&self.entry, state)
    }

    /// Run the graph starting at `start` instead of the entry step.
    ///
    /// Each visited step replaces the state with its return value. After a
    /// step runs, a conditional edge wins over an unconditional one; a step
    /// with neither (or an edge to [`END`]) ends the run.
    pub fn run_from(&self, start: &str, mut state: S) -> Result<S, GraphError> {
        let (mut current, _) = self
            .steps
            .get_key_value(start)
            .ok_or_else(|| GraphError::UnknownStep(start.to_string()))?;

        log::debug!("Graph '{}': run starting at '{}'", self.name, current);

        loop {
            let step = &self.steps[current];
            log::debug!("Graph '{}': executing step '{}'", self.name, current);

            state = step.run(state).map_err(|source| {
                log::error!("Graph '{}': step '{}' failed: {}", self.name, current, source);
                GraphError::Step {
                    step: current.clone(),
                    source,
                }
            })?;

            match self.next_step(current, &state)? {
                Some(next) => current = next,
                None => break,
            }
        }

        log::debug!("Graph '{}': run finished at '{}'", self.name, current);
        Ok(state)
    }

    /// Decide where to go after `current` has run
    fn next_step(&self, current: &str, state: &S) -> Result<Option<&String>, GraphError> {
        if let Some(edge) = self.conditional.get(current) {
            let label = (edge.selector)(state);
            let to = edge
                .routes
                .get(&label)
                .ok_or_else(|| GraphError::UnroutableLabel {
                    step: current.to_string(),
                    label: label.clone(),
                })?;

            log::debug!(
                "Graph '{}': '{}' routed '{}' -> '{}'",
                self.name,
                current,
                label,
                to
            );
            return Ok(self.resolve(to));
        }

        if let Some(to) = self.edges.get(current) {
            return Ok(self.resolve(to));
        }

        if self.finish.contains(current) {
            log::debug!("Graph '{}': reached finish step '{}'", self.name, current);
        }
        Ok(None)
    }

    /// Map a destination name to the registered key, `None` for [`END`]
    fn resolve(&self, to: &str) -> Option<&String> {
        if to == END {
            return None;
        }
        self.steps.get_key_value(to).map(|(name, _)| name)
    }
}

impl<S> fmt::Debug for CompiledGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("structure", &self.structure())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::StateGraph;
    use super::*;
    use crate::engine::step::StepError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Record {
        result: String,
        choice: String,
        unrelated: u32,
    }

    fn append(text: &'static str) -> impl Fn(Record) -> Result<Record, StepError> {
        move |mut record: Record| -> Result<Record, StepError> {
            record.result.push_str(text);
            Ok(record)
        }
    }

    fn linear() -> CompiledGraph<Record> {
        let mut graph = StateGraph::new("linear");
        graph
            .add_step("first", append("a"))
            .unwrap()
            .add_step("second", append("b"))
            .unwrap()
            .add_step("third", append("c"))
            .unwrap()
            .add_edge("first", "second")
            .unwrap()
            .add_edge("second", "third")
            .unwrap()
            .set_entry("first")
            .unwrap()
            .add_finish("third")
            .unwrap();
        graph.finalize().unwrap()
    }

    fn branching() -> CompiledGraph<Record> {
        let mut graph = StateGraph::new("branching");
        graph
            .add_step("router", |r: Record| -> Result<Record, StepError> { Ok(r) })
            .unwrap()
            .add_step("left", append("L"))
            .unwrap()
            .add_step("right", append("R"))
            .unwrap()
            .add_conditional_edge(
                "router",
                |r: &Record| r.choice.clone(),
                [("left", "left"), ("right", "right")],
            )
            .unwrap()
            .set_entry("router")
            .unwrap();
        graph.finalize().unwrap()
    }

    #[test]
    fn test_linear_chain_applies_steps_in_order() {
        let result = linear().run(Record::default()).unwrap();
        assert_eq!(result.result, "abc");
    }

    #[test]
    fn test_graph_is_reusable_across_runs() {
        let graph = linear();
        let first = graph.run(Record::default()).unwrap();
        let second = graph
            .run(Record {
                result: "x".to_string(),
                ..Record::default()
            })
            .unwrap();
        assert_eq!(first.result, "abc");
        assert_eq!(second.result, "xabc");
    }

    #[test]
    fn test_each_step_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut graph = StateGraph::new("count");
        graph
            .add_step("one", move |n: u32| -> Result<u32, StepError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(n + 1)
            })
            .unwrap()
            .add_step("two", |n: u32| -> Result<u32, StepError> { Ok(n * 10) })
            .unwrap()
            .add_edge("one", "two")
            .unwrap()
            .set_entry("one")
            .unwrap();

        let result = graph.finalize().unwrap().run(1).unwrap();
        assert_eq!(result, 20);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_conditional_routing_follows_label() {
        let graph = branching();
        let left = graph
            .run(Record {
                choice: "left".to_string(),
                ..Record::default()
            })
            .unwrap();
        let right = graph
            .run(Record {
                choice: "right".to_string(),
                ..Record::default()
            })
            .unwrap();

        assert_eq!(left.result, "L");
        assert_eq!(right.result, "R");
    }

    #[test]
    fn test_routing_ignores_unrelated_fields() {
        let graph = branching();
        for unrelated in [0, 7, 1000] {
            let out = graph
                .run(Record {
                    choice: "right".to_string(),
                    unrelated,
                    ..Record::default()
                })
                .unwrap();
            assert_eq!(out.result, "R");
        }
    }

    #[test]
    fn test_unmapped_label_is_unroutable() {
        let err = branching()
            .run(Record {
                choice: "middle".to_string(),
                ..Record::default()
            })
            .unwrap_err();

        match err {
            GraphError::UnroutableLabel { step, label } => {
                assert_eq!(step, "router");
                assert_eq!(label, "middle");
            }
            other => panic!("Expected UnroutableLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_conditional_edge_wins_over_unconditional() {
        let mut graph = StateGraph::new("priority");
        graph
            .add_step("start", append("s"))
            .unwrap()
            .add_step("plain", append("p"))
            .unwrap()
            .add_step("branch", append("b"))
            .unwrap()
            .add_edge("start", "plain")
            .unwrap()
            .add_conditional_edge("start", |_: &Record| "go", [("go", "branch")])
            .unwrap()
            .set_entry("start")
            .unwrap();

        let out = graph.finalize().unwrap().run(Record::default()).unwrap();
        assert_eq!(out.result, "sb");
    }

    #[test]
    fn test_route_to_end_stops() {
        let mut graph = StateGraph::new("stop");
        graph
            .add_step("only", append("o"))
            .unwrap()
            .add_step("never", append("n"))
            .unwrap()
            .add_conditional_edge("only", |_: &Record| "done", [("done", END), ("more", "never")])
            .unwrap()
            .set_entry("only")
            .unwrap();

        let out = graph.finalize().unwrap().run(Record::default()).unwrap();
        assert_eq!(out.result, "o");
    }

    #[test]
    fn test_step_error_propagates() {
        let mut graph = StateGraph::new("failing");
        graph
            .add_step("ok", append("a"))
            .unwrap()
            .add_step("bad", |_: Record| -> Result<Record, StepError> {
                Err("cannot add text to a number".into())
            })
            .unwrap()
            .add_step("after", append("z"))
            .unwrap()
            .add_edge("ok", "bad")
            .unwrap()
            .add_edge("bad", "after")
            .unwrap()
            .set_entry("ok")
            .unwrap();

        let err = graph.finalize().unwrap().run(Record::default()).unwrap_err();
        assert_eq!(err.failed_step(), Some("bad"));
        let original = err.into_step_error().unwrap();
        assert_eq!(original.to_string(), "cannot add text to a number");
    }

    #[test]
    fn test_run_from_skips_earlier_steps() {
        let out = linear().run_from("second", Record::default()).unwrap();
        assert_eq!(out.result, "bc");
    }

    #[test]
    fn test_run_from_unknown_step() {
        let err = linear().run_from("nowhere", Record::default()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownStep(ref name) if name == "nowhere"));
    }

    #[test]
    fn test_finalize_twice_is_structurally_equal() {
        let mut graph = StateGraph::new("twice");
        graph
            .add_step("a", append("a"))
            .unwrap()
            .add_step("b", append("b"))
            .unwrap()
            .add_conditional_edge("a", |_: &Record| "next", [("next", "b"), ("stop", END)])
            .unwrap()
            .set_entry("a")
            .unwrap()
            .add_finish("b")
            .unwrap();

        let first = graph.finalize().unwrap();
        let second = graph.finalize().unwrap();
        assert_eq!(first.structure(), second.structure());
        assert_eq!(
            first.run(Record::default()).unwrap(),
            second.run(Record::default()).unwrap()
        );
    }

    #[test]
    fn test_concurrent_runs_share_one_graph() {
        let graph = Arc::new(linear());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let graph = Arc::clone(&graph);
                std::thread::spawn(move || {
                    graph
                        .run(Record {
                            result: i.to_string(),
                            ..Record::default()
                        })
                        .unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap().result, format!("{}abc", i));
        }
    }

    #[test]
    fn test_structure_describes_wiring() {
        let structure = branching().structure();
        assert_eq!(structure.entry, "router");
        assert_eq!(structure.steps, vec!["router", "left", "right"]);
        assert_eq!(structure.conditional_edges["router"]["left"], "left");
        assert!(structure.edges.is_empty());
    }
}
