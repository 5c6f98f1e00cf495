//! Graph builder - accumulates steps and edges, validates, finalizes

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use super::compiled::CompiledGraph;
use super::edge::{ConditionalEdge, EdgeKind, Route, Selector, END, START};
use crate::engine::error::GraphError;
use crate::engine::step::{Step, StepError};

/// Builder for a graph of named steps over a state record `S`.
///
/// Every mutating method validates its arguments immediately and returns
/// `&mut Self` so calls can be chained with `?`:
///
/// ```
/// use waypoint_rs::engine::graph::StateGraph;
/// use waypoint_rs::engine::step::StepError;
///
/// fn shout(s: String) -> Result<String, StepError> {
///     Ok(s.to_uppercase())
/// }
///
/// fn bang(s: String) -> Result<String, StepError> {
///     Ok(s + "!")
/// }
///
/// let mut graph = StateGraph::new("loud");
/// graph
///     .add_step("shout", shout)?
///     .add_step("bang", bang)?
///     .add_edge("shout", "bang")?
///     .set_entry("shout")?
///     .add_finish("bang")?;
///
/// let app = graph.finalize()?;
/// assert_eq!(app.run("hi".to_string())?, "HI!");
/// # Ok::<(), waypoint_rs::engine::error::GraphError>(())
/// ```
pub struct StateGraph<S> {
    name: String,
    steps: HashMap<String, Arc<dyn Step<S>>>,
    /// Registration order, used for deterministic reporting
    order: Vec<String>,
    edges: HashMap<String, String>,
    conditional: HashMap<String, ConditionalEdge<S>>,
    entry: Option<String>,
    finish: BTreeSet<String>,
    resume_points: BTreeSet<String>,
}

impl<S: 'static> StateGraph<S> {
    /// Create an empty graph builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: HashMap::new(),
            order: Vec::new(),
            edges: HashMap::new(),
            conditional: HashMap::new(),
            entry: None,
            finish: BTreeSet::new(),
            resume_points: BTreeSet::new(),
        }
    }

    /// Name of the graph, used in log lines
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a step function under `name`
    pub fn add_step<F>(&mut self, name: impl Into<String>, step: F) -> Result<&mut Self, GraphError>
    where
        F: Fn(S) -> Result<S, StepError> + Send + Sync + 'static,
    {
        self.add_shared_step(name, Arc::new(step))
    }

    /// Register an already shared step (e.g. one taken from a registry)
    pub fn add_shared_step(
        &mut self,
        name: impl Into<String>,
        step: Arc<dyn Step<S>>,
    ) -> Result<&mut Self, GraphError> {
        let name = name.into();
        if self.steps.contains_key(&name) {
            return Err(GraphError::DuplicateStep(name));
        }

        log::debug!("Graph '{}': registered step '{}'", self.name, name);
        self.order.push(name.clone());
        self.steps.insert(name, step);
        Ok(self)
    }

    /// Add an unconditional edge.
    ///
    /// `from` may be [`START`], which sets the entry step; `to` may be
    /// [`END`], which stops the run after `from`.
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<&mut Self, GraphError> {
        let from = from.into();
        let to = to.into();

        if from == START {
            return self.set_entry(to);
        }

        self.require_step(&from)?;
        self.require_destination(&to)?;

        if self.edges.contains_key(&from) {
            return Err(GraphError::DuplicateEdge {
                step: from,
                kind: EdgeKind::Unconditional,
            });
        }

        self.edges.insert(from, to);
        Ok(self)
    }

    /// Add a branching edge.
    ///
    /// After `from` runs, `selector` is applied to the state and its label is
    /// looked up in `routes`. Labels missing from `routes` fail the run with
    /// [`GraphError::UnroutableLabel`] when they are produced.
    pub fn add_conditional_edge<F, L, I, K, V>(
        &mut self,
        from: impl Into<String>,
        selector: F,
        routes: I,
    ) -> Result<&mut Self, GraphError>
    where
        F: Fn(&S) -> L + Send + Sync + 'static,
        L: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let routes: BTreeMap<String, String> = routes
            .into_iter()
            .map(|(label, to)| (label.into(), to.into()))
            .collect();
        let selector: Selector<S> = Arc::new(move |state: &S| -> String { selector(state).into() });

        self.insert_conditional(from.into(), selector, routes)
    }

    /// Add a branching edge whose selector returns a [`Route`].
    ///
    /// The route table must map every variant of `R`; a missing one fails
    /// here with [`GraphError::UnroutableLabel`].
    pub fn add_routed_edge<R, F, I, V>(
        &mut self,
        from: impl Into<String>,
        selector: F,
        routes: I,
    ) -> Result<&mut Self, GraphError>
    where
        R: Route,
        F: Fn(&S) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = (R, V)>,
        V: Into<String>,
    {
        let from = from.into();
        let routes: BTreeMap<String, String> = routes
            .into_iter()
            .map(|(route, to)| (route.label().to_string(), to.into()))
            .collect();

        if let Some(missing) = R::all().iter().find(|r| !routes.contains_key(r.label())) {
            return Err(GraphError::UnroutableLabel {
                step: from,
                label: missing.label().to_string(),
            });
        }

        let selector: Selector<S> =
            Arc::new(move |state: &S| -> String { selector(state).label().to_string() });

        self.insert_conditional(from, selector, routes)
    }

    /// Mark the step the run starts from
    pub fn set_entry(&mut self, name: impl Into<String>) -> Result<&mut Self, GraphError> {
        let name = name.into();
        self.require_step(&name)?;

        if let Some(previous) = self.entry.replace(name) {
            log::warn!(
                "Graph '{}': entry point '{}' replaced",
                self.name,
                previous
            );
        }
        Ok(self)
    }

    /// Mark a terminal step
    pub fn add_finish(&mut self, name: impl Into<String>) -> Result<&mut Self, GraphError> {
        let name = name.into();
        self.require_step(&name)?;
        self.finish.insert(name);
        Ok(self)
    }

    /// Mark a step a session may re-enter the graph at
    pub fn add_resume_point(&mut self, name: impl Into<String>) -> Result<&mut Self, GraphError> {
        let name = name.into();
        self.require_step(&name)?;
        self.resume_points.insert(name);
        Ok(self)
    }

    /// Produce an immutable, runnable graph.
    ///
    /// Unreachable steps are tolerated and logged.
    pub fn finalize(&self) -> Result<CompiledGraph<S>, GraphError> {
        let entry = self.entry.clone().ok_or(GraphError::NoEntryPoint)?;

        for step in self.unreachable_steps(&entry) {
            log::warn!(
                "Graph '{}': step '{}' is not reachable from '{}'",
                self.name,
                step,
                entry
            );
        }

        Ok(self.compile(entry))
    }

    /// Like [`finalize`](Self::finalize), but unreachable steps are errors
    pub fn finalize_strict(&self) -> Result<CompiledGraph<S>, GraphError> {
        let entry = self.entry.clone().ok_or(GraphError::NoEntryPoint)?;

        if let Some(step) = self.unreachable_steps(&entry).into_iter().next() {
            return Err(GraphError::UnreachableStep(step));
        }

        Ok(self.compile(entry))
    }

    fn compile(&self, entry: String) -> CompiledGraph<S> {
        log::info!(
            "Finalized graph '{}' with {} steps (entry: {})",
            self.name,
            self.order.len(),
            entry
        );

        CompiledGraph {
            name: self.name.clone(),
            steps: self.steps.clone(),
            order: self.order.clone(),
            edges: self.edges.clone(),
            conditional: self.conditional.clone(),
            entry,
            finish: self.finish.clone(),
            resume_points: self.resume_points.clone(),
        }
    }

    fn insert_conditional(
        &mut self,
        from: String,
        selector: Selector<S>,
        routes: BTreeMap<String, String>,
    ) -> Result<&mut Self, GraphError> {
        self.require_step(&from)?;
        for to in routes.values() {
            self.require_destination(to)?;
        }

        if self.conditional.contains_key(&from) {
            return Err(GraphError::DuplicateEdge {
                step: from,
                kind: EdgeKind::Conditional,
            });
        }

        self.conditional
            .insert(from, ConditionalEdge { selector, routes });
        Ok(self)
    }

    /// Steps with no path from the entry point or any resume point,
    /// in registration order
    fn unreachable_steps(&self, entry: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(entry);
        queue.extend(self.resume_points.iter().map(String::as_str));

        while let Some(step) = queue.pop_front() {
            if step == END || !seen.insert(step) {
                continue;
            }
            if let Some(to) = self.edges.get(step) {
                queue.push_back(to.as_str());
            }
            if let Some(edge) = self.conditional.get(step) {
                queue.extend(edge.routes.values().map(String::as_str));
            }
        }

        self.order
            .iter()
            .filter(|name| !seen.contains(name.as_str()))
            .cloned()
            .collect()
    }

    fn require_step(&self, name: &str) -> Result<(), GraphError> {
        if self.steps.contains_key(name) {
            Ok(())
        } else {
            Err(GraphError::UnknownStep(name.to_string()))
        }
    }

    fn require_destination(&self, name: &str) -> Result<(), GraphError> {
        if name == END {
            Ok(())
        } else {
            self.require_step(name)
        }
    }
}

impl<S> fmt::Debug for StateGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGraph")
            .field("name", &self.name)
            .field("steps", &self.order)
            .field("edges", &self.edges)
            .field("conditional_edges", &self.conditional.len())
            .field("entry", &self.entry)
            .field("finish", &self.finish)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Sign {
        Positive,
        Negative,
    }

    impl Route for Sign {
        fn all() -> &'static [Self] {
            &[Sign::Positive, Sign::Negative]
        }

        fn label(&self) -> &'static str {
            match self {
                Sign::Positive => "positive",
                Sign::Negative => "negative",
            }
        }
    }

    fn keep(n: i64) -> Result<i64, StepError> {
        Ok(n)
    }

    fn graph_with(steps: &[&str]) -> StateGraph<i64> {
        let mut graph = StateGraph::new("test");
        for name in steps {
            graph.add_step(*name, keep).unwrap();
        }
        graph
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let mut graph = graph_with(&["a"]);
        let err = graph.add_step("a", keep).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateStep(ref name) if name == "a"));
    }

    #[test]
    fn test_edge_requires_registered_endpoints() {
        let mut graph = graph_with(&["a"]);

        let err = graph.add_edge("a", "b").unwrap_err();
        assert!(matches!(err, GraphError::UnknownStep(ref name) if name == "b"));

        let err = graph.add_edge("z", "a").unwrap_err();
        assert!(matches!(err, GraphError::UnknownStep(ref name) if name == "z"));
    }

    #[test]
    fn test_edge_to_end_is_allowed() {
        let mut graph = graph_with(&["a"]);
        assert!(graph.add_edge("a", END).is_ok());
    }

    #[test]
    fn test_edge_from_start_sets_entry() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a").unwrap();
        assert_eq!(graph.finalize().unwrap().entry(), "a");
    }

    #[test]
    fn test_second_unconditional_edge_rejected() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge("a", "b").unwrap();
        let err = graph.add_edge("a", "c").unwrap_err();
        assert!(matches!(
            err,
            GraphError::DuplicateEdge {
                kind: EdgeKind::Unconditional,
                ..
            }
        ));
    }

    #[test]
    fn test_conditional_edge_validates_destinations() {
        let mut graph = graph_with(&["a", "b"]);
        let err = graph
            .add_conditional_edge("a", |_| "x", [("x", "b"), ("y", "missing")])
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownStep(ref name) if name == "missing"));

        let err = graph
            .add_conditional_edge("ghost", |_| "x", [("x", "b")])
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownStep(ref name) if name == "ghost"));
    }

    #[test]
    fn test_routed_edge_requires_every_variant() {
        let mut graph = graph_with(&["check", "up"]);
        let err = graph
            .add_routed_edge(
                "check",
                |n: &i64| if *n >= 0 { Sign::Positive } else { Sign::Negative },
                [(Sign::Positive, "up")],
            )
            .unwrap_err();

        match err {
            GraphError::UnroutableLabel { step, label } => {
                assert_eq!(step, "check");
                assert_eq!(label, "negative");
            }
            other => panic!("Expected UnroutableLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_entry_and_finish_require_registered_steps() {
        let mut graph = graph_with(&["a"]);
        assert!(matches!(
            graph.set_entry("b").unwrap_err(),
            GraphError::UnknownStep(_)
        ));
        assert!(matches!(
            graph.add_finish("b").unwrap_err(),
            GraphError::UnknownStep(_)
        ));
        assert!(matches!(
            graph.add_resume_point("b").unwrap_err(),
            GraphError::UnknownStep(_)
        ));
    }

    #[test]
    fn test_finalize_without_entry_fails() {
        let graph = graph_with(&["a"]);
        assert!(matches!(
            graph.finalize().unwrap_err(),
            GraphError::NoEntryPoint
        ));
    }

    #[test]
    fn test_unreachable_steps_tolerated_by_finalize() {
        let mut graph = graph_with(&["a", "orphan"]);
        graph.set_entry("a").unwrap();

        assert!(graph.finalize().is_ok());

        let err = graph.finalize_strict().unwrap_err();
        assert!(matches!(err, GraphError::UnreachableStep(ref name) if name == "orphan"));
    }

    #[test]
    fn test_resume_points_count_as_roots() {
        let mut graph = graph_with(&["a", "resume", "after"]);
        graph
            .set_entry("a")
            .unwrap()
            .add_resume_point("resume")
            .unwrap()
            .add_edge("resume", "after")
            .unwrap();

        assert!(graph.finalize_strict().is_ok());
    }

    #[test]
    fn test_conditional_routes_count_for_reachability() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph
            .set_entry("a")
            .unwrap()
            .add_conditional_edge("a", |_| "left", [("left", "b"), ("right", "c")])
            .unwrap();

        assert!(graph.finalize_strict().is_ok());
    }
}
