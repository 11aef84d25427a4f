//! Stage planning and staged execution of fragment providers.

use super::validate::check_dependencies;
use crate::error::{ComposeError, ComposeResult};
use crate::fragments::{FragmentProvider, ProduceContext, Registry, Stage};
use crate::options::{Facts, GlobalOptions, resolve_all};
use crate::types::{OptionsRecord, RuleBlock};
use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span};

/// One enabled fragment with its resolved options.
#[derive(Clone)]
pub struct PlannedFragment {
    pub provider: Arc<dyn FragmentProvider>,
    pub options: OptionsRecord,
}

impl PlannedFragment {
    pub fn name(&self) -> &'static str {
        self.provider.name()
    }
}

impl fmt::Debug for PlannedFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedFragment")
            .field("name", &self.name())
            .field("options", &self.options)
            .finish()
    }
}

/// Fragments of one stage, in declared order.
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub stage: Stage,
    pub fragments: Vec<PlannedFragment>,
}

/// Ordered invocation plan. Stages without enabled fragments are left out.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    stages: Vec<StagePlan>,
}

impl Plan {
    pub fn stages(&self) -> &[StagePlan] {
        &self.stages
    }

    /// Enabled fragment names in invocation order.
    pub fn fragment_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .flat_map(|s| s.fragments.iter().map(PlannedFragment::name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Resolve options, check hard dependencies and group enabled fragments by stage.
///
/// Runs before any provider does, so dependency errors never leave partial work.
pub fn linearize(global: &GlobalOptions, registry: &Registry) -> ComposeResult<(Facts, Plan)> {
    let (facts, descriptors) = resolve_all(global, registry);
    check_dependencies(registry, &facts)?;

    let enabled: Vec<PlannedFragment> = registry
        .iter()
        .zip(descriptors)
        .filter(|(_, descriptor)| descriptor.enabled)
        .map(|(provider, descriptor)| PlannedFragment {
            provider: Arc::clone(provider),
            options: descriptor.options,
        })
        .collect();

    let stages = Stage::ALL
        .iter()
        .map(|&stage| StagePlan {
            stage,
            fragments: enabled
                .iter()
                .filter(|f| f.provider.stage() == stage)
                .cloned()
                .collect(),
        })
        .filter(|s| !s.fragments.is_empty())
        .collect();

    Ok((facts, Plan { stages }))
}

async fn run_fragment(
    stage: Stage,
    fragment: &PlannedFragment,
    cx: &ProduceContext<'_>,
) -> ComposeResult<Vec<RuleBlock>> {
    let provider = &fragment.provider;
    let mut blocks = provider
        .produce(&fragment.options, cx)
        .instrument(debug_span!("fragment", fragment = provider.name()))
        .await
        .map_err(|source| ComposeError::Provider {
            fragment: provider.name().to_string(),
            stage,
            source,
        })?;

    if provider.repeatable() {
        for block in &mut blocks {
            block.repeatable = true;
        }
    }
    Ok(blocks)
}

/// Run the plan one stage at a time.
///
/// Providers of a stage run concurrently; their output keeps declared order.
/// The first failure aborts the remaining stages.
pub async fn execute(plan: &Plan, cx: &ProduceContext<'_>) -> ComposeResult<Vec<RuleBlock>> {
    let mut blocks = Vec::new();
    for stage_plan in plan.stages() {
        let stage = stage_plan.stage;
        let outputs = try_join_all(
            stage_plan
                .fragments
                .iter()
                .map(|fragment| run_fragment(stage, fragment, cx)),
        )
        .instrument(debug_span!("stage", stage = %stage))
        .await?;

        let produced: usize = outputs.iter().map(Vec::len).sum();
        debug!(
            stage = %stage,
            fragments = stage_plan.fragments.len(),
            blocks = produced,
            "Stage complete"
        );
        blocks.extend(outputs.into_iter().flatten());
    }
    Ok(blocks)
}
