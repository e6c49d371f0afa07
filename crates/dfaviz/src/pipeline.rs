use crate::{
    AnnotatedGraph, AutomatonEngine, Diagnostic, GraphDescription, HandleScope,
    PipelineEventKind, PipelineEventSink, RenderRequest, StateRoles, Transform, VizConfig,
    VizError, prepare_description,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a single invocation currently is. `Done` and `Failed` are terminal
/// and are only entered after every engine handle has been released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    BuildingEnfa,
    ConvertingToNfa,
    Minimizing,
    ExtractingGraph,
    Annotating,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::BuildingEnfa => "building_enfa",
            Self::ConvertingToNfa => "converting_to_nfa",
            Self::Minimizing => "minimizing",
            Self::ExtractingGraph => "extracting_graph",
            Self::Annotating => "annotating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visualization {
    pub graph: AnnotatedGraph,
    pub roles: StateRoles,
    pub state_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Visualization {
    pub fn into_render_request(self, width_hint: Option<u32>) -> RenderRequest {
        RenderRequest {
            graph: self.graph,
            width_hint,
        }
    }
}

struct StageTracker<'a> {
    stage: PipelineStage,
    events: &'a PipelineEventSink,
}

impl<'a> StageTracker<'a> {
    fn new(events: &'a PipelineEventSink) -> Self {
        Self {
            stage: PipelineStage::Idle,
            events,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug!(from = self.stage.as_str(), to = stage.as_str(), "pipeline stage");
        self.stage = stage;
        self.events.emit(PipelineEventKind::StageEntered { stage });
    }

    fn fail(&mut self, error: &VizError) {
        let failed_in = self.stage;
        warn!(stage = failed_in.as_str(), kind = error.kind(), error = %error, "pipeline failed");
        self.enter(PipelineStage::Failed);
        self.events.emit(PipelineEventKind::Failed {
            stage: failed_in,
            error_kind: error.kind().to_string(),
            reason: error.to_string(),
        });
    }
}

/// Drives the automaton engine from a regex to an annotated description.
///
/// The visualizer holds no per-invocation state; concurrent calls each get
/// their own handle scope.
#[derive(Clone)]
pub struct RegexVisualizer {
    engine: Arc<dyn AutomatonEngine>,
    config: VizConfig,
    events: PipelineEventSink,
    transforms: Vec<Arc<dyn Transform>>,
}

impl RegexVisualizer {
    pub fn new(engine: Arc<dyn AutomatonEngine>) -> Self {
        Self {
            engine,
            config: VizConfig::default(),
            events: PipelineEventSink::default(),
            transforms: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: VizConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_events(mut self, events: PipelineEventSink) -> Self {
        self.events = events;
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub async fn visualize(&self, regex: &str) -> Result<Visualization, VizError> {
        let mut tracker = StageTracker::new(&self.events);
        let mut scope = HandleScope::new(self.events.clone());

        let outcome = self.drive(regex, &mut scope, &mut tracker).await;
        let released = scope.release_all();

        match (outcome, released) {
            (Ok(visualization), Ok(())) => {
                tracker.enter(PipelineStage::Done);
                self.events.emit(PipelineEventKind::Completed {
                    state_count: visualization.state_count,
                    diagnostics_count: visualization.diagnostics.len(),
                });
                info!(
                    regex,
                    start = %visualization.roles.start,
                    accepting = visualization.roles.accepting.len(),
                    "regex visualized"
                );
                Ok(visualization)
            }
            (Ok(_), Err(release_error)) => {
                let error = VizError::EngineResource(release_error.to_string());
                tracker.fail(&error);
                Err(error)
            }
            (Err(error), released) => {
                if let Err(release_error) = released {
                    warn!(error = %release_error, "handle release failed after pipeline error");
                }
                tracker.fail(&error);
                Err(error)
            }
        }
    }

    async fn drive(
        &self,
        regex: &str,
        scope: &mut HandleScope,
        tracker: &mut StageTracker<'_>,
    ) -> Result<Visualization, VizError> {
        tracker.enter(PipelineStage::BuildingEnfa);
        let enfa = self.engine.build_epsilon_nfa(regex).await?;
        let enfa = scope.hold_enfa(enfa);

        tracker.enter(PipelineStage::ConvertingToNfa);
        let nfa = enfa.convert_to_nfa().await?;
        let nfa = scope.hold_nfa(nfa);

        tracker.enter(PipelineStage::Minimizing);
        let dfa = nfa.minimized_dfa().await?;
        let dfa = scope.hold_dfa(dfa);

        tracker.enter(PipelineStage::ExtractingGraph);
        let graph = dfa.graph_representation().await?;
        let graph = scope.hold_graph(graph);
        let source = graph.dot_description().await?;
        let roles = StateRoles::new(graph.start_state().await?, graph.accepting_states().await?);

        tracker.enter(PipelineStage::Annotating);
        let state_count = GraphDescription::parse(&source)?.node_count();
        let custom: Vec<&dyn Transform> = self
            .transforms
            .iter()
            .map(|transform| &**transform)
            .collect();
        let (graph, diagnostics) = prepare_description(&source, &roles, &self.config, &custom)?;

        Ok(Visualization {
            graph,
            roles,
            state_count,
            diagnostics,
        })
    }
}
