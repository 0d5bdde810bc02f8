//! Final clean pass and delivery of the assembled network.

use std::sync::Arc;

use crate::assembler::{NetworkAssembler, NetworkState};
use crate::engine::{CleanEngine, CleanReport, Engines, NETWORK_CLEAN};
use crate::error::{EngineKind, Error, Result};
use crate::workspace::NETWORK_NAME;

/// Turns the running network into the delivered output layer.
#[derive(Clone)]
pub struct Finisher {
    clean: Arc<dyn CleanEngine>,
}

impl Finisher {
    pub fn new(engines: &Engines) -> Self {
        Self {
            clean: Arc::clone(&engines.clean),
        }
    }

    /// Deliver the network under `output` and attach an empty attribute table.
    ///
    /// Merged networks get a final clean pass and the intermediate network is
    /// dropped. A two-point network was already cleaned by the assembler and
    /// is delivered as-is; the returned report is `None` in that case.
    pub fn finish(
        &self,
        mut assembler: NetworkAssembler<'_>,
        output: &str,
    ) -> Result<Option<CleanReport>> {
        let total = assembler.total_points();
        let completed = assembler.completed();
        if completed != total {
            return Err(Error::IncompleteNetwork {
                iterations: completed,
                total,
            });
        }

        let state = assembler.state().clone();
        let workspace = assembler.workspace_mut();
        let report = match state {
            NetworkState::Merged => {
                tracing::info!("finishing the final vector output");
                let report = self
                    .clean
                    .clean(workspace, NETWORK_NAME, output, &NETWORK_CLEAN)
                    .map_err(|error| Error::engine_invocation(EngineKind::Clean, total, error))?;
                workspace.remove_vector(NETWORK_NAME);
                Some(report)
            }
            NetworkState::Pair => {
                workspace.rename_vector(NETWORK_NAME, output)?;
                None
            }
            NetworkState::Empty | NetworkState::Seeded { .. } => {
                return Err(Error::IncompleteNetwork {
                    iterations: completed,
                    total,
                })
            }
        };

        workspace.vector_mut(output)?.attach_empty_table();
        Ok(report)
    }
}
