//! Delta computation
//!
//! Compares a desired pipeline with the snapshot of what is running and
//! derives one [`ReconfigurationDelta`] per live instance whose
//! reconfigurable values changed. Structural edits (added or removed
//! elements, added or removed parameters) are not deltas and are skipped.

use sluice_core::domain::pipeline::{ElementInvocation, FreeTextParameter, PipelineGraph};
use sluice_core::domain::reconfiguration::ReconfigurationDelta;
use tracing::warn;

/// An element restricted to its reconfigurable parameters
///
/// Borrowed from the pipeline it was built from; the pipeline itself is
/// never modified.
#[derive(Debug)]
pub struct ReconfigurableView<'a> {
    pub element: &'a ElementInvocation,
    pub parameters: Vec<&'a FreeTextParameter>,
}

/// A parameter changed if both sides name it the same and the values differ
pub fn has_changed(desired: &FreeTextParameter, stored: &FreeTextParameter) -> bool {
    desired.internal_name == stored.internal_name && desired.value != stored.value
}

/// Views of all elements exposing at least one reconfigurable parameter
pub fn reconfigurable_views(pipeline: &PipelineGraph) -> Vec<ReconfigurableView<'_>> {
    pipeline
        .elements
        .iter()
        .map(|element| ReconfigurableView {
            element,
            parameters: element.reconfigurable_parameters().collect(),
        })
        .filter(|view| !view.parameters.is_empty())
        .collect()
}

/// Pairs desired and stored views sharing an element id, in desired order
pub fn match_elements<'v, 'a>(
    desired: &'v [ReconfigurableView<'a>],
    stored: &'v [ReconfigurableView<'a>],
) -> Vec<(&'v ReconfigurableView<'a>, &'v ReconfigurableView<'a>)> {
    let mut pairs = Vec::new();

    for d in desired {
        for s in stored {
            if d.element.element_id == s.element.element_id {
                pairs.push((d, s));
            }
        }
    }

    pairs
}

/// Desired values of every parameter that differs from the stored side
pub fn changed_parameters(
    desired: &ReconfigurableView<'_>,
    stored: &ReconfigurableView<'_>,
) -> Vec<FreeTextParameter> {
    let mut changed = Vec::new();

    for d in &desired.parameters {
        for s in &stored.parameters {
            if has_changed(d, s) {
                changed.push((*d).clone());
            }
        }
    }

    changed
}

/// Builds the ordered delta set for one reconfiguration round
///
/// At most one delta is produced per running instance; when duplicate ids
/// in the input match the same instance twice, the first match wins.
pub fn build_deltas(desired: &PipelineGraph, stored: &PipelineGraph) -> Vec<ReconfigurationDelta> {
    let desired_views = reconfigurable_views(desired);
    let stored_views = reconfigurable_views(stored);

    let mut deltas: Vec<ReconfigurationDelta> = Vec::new();

    for (d, s) in match_elements(&desired_views, &stored_views) {
        let changed = changed_parameters(d, s);
        if changed.is_empty() {
            continue;
        }

        let instance_id = &d.element.deployment_running_instance_id;
        if deltas
            .iter()
            .any(|delta| &delta.deployment_running_instance_id == instance_id)
        {
            warn!(
                instance_id = %instance_id,
                element = %d.element.name,
                "Skipping duplicate reconfiguration for instance"
            );
            continue;
        }

        deltas.push(ReconfigurationDelta {
            deployment_running_instance_id: instance_id.clone(),
            element_name: d.element.name.clone(),
            target: d.element.deployment_target.clone(),
            changed_parameters: changed,
        });
    }

    deltas
}
