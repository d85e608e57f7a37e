//! Workspace configuration for the sign-off engine.
//!
//! All paths flow from an explicit `WorkspaceConfig` passed into the
//! engine at construction. There is no ambient global state: no working
//! directory probing, no project-root discovery via external commands.

use std::path::{Path, PathBuf};

use crate::catalog::ArtifactKind;

/// Default output directory name, relative to the project root.
pub const OUTPUT_DIR: &str = "_bmad-output";

/// Explicit path configuration for one project workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
}

impl WorkspaceConfig {
    /// Create a config rooted at `project_root` with the default output
    /// directory layout.
    pub fn new(project_root: PathBuf) -> Self {
        let output_dir = project_root.join(OUTPUT_DIR);
        Self {
            project_root,
            output_dir,
        }
    }

    /// Create a config with an explicit output directory.
    pub fn with_output_dir(project_root: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            project_root,
            output_dir,
        }
    }

    pub fn governance_dir(&self) -> PathBuf {
        self.output_dir.join("governance")
    }

    pub fn governance_file(&self) -> PathBuf {
        self.governance_dir().join("governance.yaml")
    }

    pub fn initiatives_dir(&self) -> PathBuf {
        self.output_dir.join("initiatives")
    }

    pub fn initiative_dir(&self, key: &str) -> PathBuf {
        self.initiatives_dir().join(key)
    }

    pub fn state_file(&self, key: &str) -> PathBuf {
        self.initiative_dir(key).join("state.yaml")
    }

    pub fn timeline_file(&self, key: &str) -> PathBuf {
        self.initiative_dir(key).join("timeline.md")
    }

    pub fn artifacts_dir(&self, key: &str) -> PathBuf {
        self.initiative_dir(key).join("artifacts")
    }

    pub fn artifact_file(&self, key: &str, kind: ArtifactKind) -> PathBuf {
        self.artifacts_dir(key).join(kind.file_name())
    }

    /// The governance path as recorded inside initiative state documents.
    /// Relative to the project root when the output directory sits under
    /// it, absolute otherwise.
    pub fn governance_ref(&self) -> String {
        let file = self.governance_file();
        match file.strip_prefix(&self.project_root) {
            Ok(rel) => rel.display().to_string(),
            Err(_) => file.display().to_string(),
        }
    }
}

impl AsRef<Path> for WorkspaceConfig {
    fn as_ref(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_under_project_root() {
        let config = WorkspaceConfig::new(PathBuf::from("/work/proj"));
        assert_eq!(
            config.governance_file(),
            PathBuf::from("/work/proj/_bmad-output/governance/governance.yaml")
        );
        assert_eq!(
            config.state_file("FEAT-1"),
            PathBuf::from("/work/proj/_bmad-output/initiatives/FEAT-1/state.yaml")
        );
        assert_eq!(
            config.timeline_file("FEAT-1"),
            PathBuf::from("/work/proj/_bmad-output/initiatives/FEAT-1/timeline.md")
        );
    }

    #[test]
    fn test_artifact_file_uses_catalog_file_name() {
        let config = WorkspaceConfig::new(PathBuf::from("/work/proj"));
        assert_eq!(
            config.artifact_file("FEAT-1", ArtifactKind::EpicsStories),
            PathBuf::from(
                "/work/proj/_bmad-output/initiatives/FEAT-1/artifacts/EPICS_AND_STORIES.md"
            )
        );
    }

    #[test]
    fn test_governance_ref_is_relative_when_nested() {
        let config = WorkspaceConfig::new(PathBuf::from("/work/proj"));
        assert_eq!(
            config.governance_ref(),
            "_bmad-output/governance/governance.yaml"
        );
    }

    #[test]
    fn test_governance_ref_is_absolute_when_outside_root() {
        let config = WorkspaceConfig::with_output_dir(
            PathBuf::from("/work/proj"),
            PathBuf::from("/var/signoff"),
        );
        assert_eq!(
            config.governance_ref(),
            "/var/signoff/governance/governance.yaml"
        );
    }
}
