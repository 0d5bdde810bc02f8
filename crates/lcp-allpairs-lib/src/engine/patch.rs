use serde::Serialize;

use crate::error::{Error, Result};
use crate::vector::VectorLayer;
use crate::workspace::Workspace;

use super::MergeEngine;

/// How the merge engine treats its output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchMode {
    /// Create a new layer from the inputs; the output must not exist yet.
    Base,
    /// Add the inputs to an existing output layer in place.
    Append,
}

/// Concatenates line layers. The output is only touched once every input has
/// been read, so a failed patch leaves it as it was.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePatch;

impl MergeEngine for NativePatch {
    fn patch(
        &self,
        workspace: &mut Workspace,
        inputs: &[&str],
        output: &str,
        mode: PatchMode,
    ) -> Result<()> {
        if inputs.is_empty() {
            return Err(Error::Engine("patch needs at least one input layer".to_string()));
        }
        if inputs.contains(&output) {
            return Err(Error::Engine(format!(
                "patch output {output} is also one of its inputs"
            )));
        }

        let mut lines = Vec::new();
        for name in inputs {
            lines.extend(workspace.vector(name)?.lines().iter().cloned());
        }

        match mode {
            PatchMode::Base => {
                workspace.insert_vector(output, VectorLayer::new(lines), false)?;
            }
            PatchMode::Append => {
                workspace.vector_mut(output)?.extend(lines);
            }
        }
        tracing::trace!(?mode, output, inputs = inputs.len(), "patched line layers");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn workspace_with(names: &[&str]) -> Workspace {
        let mut workspace = Workspace::new();
        for (index, name) in names.iter().enumerate() {
            let x = index as f64;
            let layer = VectorLayer::new(vec![LineString::from(vec![(x, 0.0), (x, 1.0)])]);
            workspace.insert_vector(name, layer, false).unwrap();
        }
        workspace
    }

    #[test]
    fn base_merge_concatenates_inputs() {
        let mut workspace = workspace_with(&["one", "two"]);
        NativePatch
            .patch(&mut workspace, &["one", "two"], "merged", PatchMode::Base)
            .unwrap();
        assert_eq!(workspace.vector("merged").unwrap().len(), 2);
        assert!(workspace.contains("one") && workspace.contains("two"));
    }

    #[test]
    fn base_merge_refuses_existing_output() {
        let mut workspace = workspace_with(&["one", "merged"]);
        let error = NativePatch
            .patch(&mut workspace, &["one"], "merged", PatchMode::Base)
            .expect_err("exists");
        assert!(matches!(error, Error::ArtifactExists { .. }));
        assert_eq!(workspace.vector("merged").unwrap().len(), 1);
    }

    #[test]
    fn append_extends_in_place() {
        let mut workspace = workspace_with(&["net", "extra"]);
        NativePatch
            .patch(&mut workspace, &["extra"], "net", PatchMode::Append)
            .unwrap();
        assert_eq!(workspace.vector("net").unwrap().len(), 2);
    }

    #[test]
    fn append_with_missing_input_leaves_output_untouched() {
        let mut workspace = workspace_with(&["net"]);
        let error = NativePatch
            .patch(&mut workspace, &["ghost"], "net", PatchMode::Append)
            .expect_err("missing input");
        assert!(matches!(error, Error::ArtifactMissing { .. }));
        assert_eq!(workspace.vector("net").unwrap().len(), 1);
    }
}
