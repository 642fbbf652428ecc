//! Directed acyclic graph of pipeline stages.
//!
//! The graph only describes ordering. [`StageGraph::validate`] rejects cycles
//! and edges to unknown stages; the runner consults [`StageGraph::predecessors`]
//! before starting a stage and [`StageGraph::downstream_of`] to propagate a
//! failure.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::stage::StageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageGraph {
    stages: Vec<StageId>,
    edges: Vec<(StageId, StageId)>,
}

impl StageGraph {
    pub fn new(stages: Vec<StageId>, edges: Vec<(StageId, StageId)>) -> Self {
        Self { stages, edges }
    }

    /// `start → {risk_analysis, esg_analysis}`, `risk_analysis → dependency_graph`.
    pub fn standard() -> Self {
        Self::new(
            StageId::ALL.to_vec(),
            vec![
                (StageId::Start, StageId::RiskAnalysis),
                (StageId::Start, StageId::EsgAnalysis),
                (StageId::RiskAnalysis, StageId::DependencyGraph),
            ],
        )
    }

    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    /// Check the graph and return its stages in topological order.
    pub fn validate(&self) -> PipelineResult<Vec<StageId>> {
        let known: BTreeSet<StageId> = self.stages.iter().copied().collect();
        if known.len() != self.stages.len() {
            return Err(PipelineError::InvalidStageGraph {
                reason: "duplicate stage".to_string(),
            });
        }

        let mut in_degree: BTreeMap<StageId, usize> =
            self.stages.iter().map(|s| (*s, 0)).collect();
        for (from, to) in &self.edges {
            if !known.contains(from) || !known.contains(to) {
                return Err(PipelineError::InvalidStageGraph {
                    reason: format!("edge {from} -> {to} references an unknown stage"),
                });
            }
            *in_degree.entry(*to).or_default() += 1;
        }

        let mut ready: VecDeque<StageId> = self
            .stages
            .iter()
            .copied()
            .filter(|s| in_degree.get(s) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.stages.len());

        while let Some(stage) = ready.pop_front() {
            order.push(stage);
            for next in self.dependents(stage) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(next);
                    }
                }
            }
        }

        if order.len() != self.stages.len() {
            return Err(PipelineError::InvalidStageGraph {
                reason: "cycle detected".to_string(),
            });
        }
        Ok(order)
    }

    pub fn predecessors(&self, stage: StageId) -> Vec<StageId> {
        self.edges
            .iter()
            .filter(|(_, to)| *to == stage)
            .map(|(from, _)| *from)
            .collect()
    }

    pub fn dependents(&self, stage: StageId) -> Vec<StageId> {
        self.edges
            .iter()
            .filter(|(from, _)| *from == stage)
            .map(|(_, to)| *to)
            .collect()
    }

    /// Every stage reachable from `stage`, excluding `stage` itself.
    pub fn downstream_of(&self, stage: StageId) -> BTreeSet<StageId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<StageId> = self.dependents(stage).into();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                queue.extend(self.dependents(next));
            }
        }
        seen
    }
}

impl Default for StageGraph {
    fn default() -> Self {
        Self::standard()
    }
}
