//! Static artifact catalog for the sign-off workflow.
//!
//! This module provides:
//! - `Group`: the three stakeholder categories whose leads sign off
//! - `ArtifactKind`: the five required artifacts, in progression order
//! - Per-kind required-group sets, file names, and branch naming
//!
//! The catalog is configuration-as-code: it is compiled in and never
//! mutated at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stakeholder group whose leads must approve certain artifacts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// Business analysis
    Ba,
    /// Design
    Design,
    /// Development
    Dev,
}

impl Group {
    /// All groups, in canonical order.
    pub const ALL: [Group; 3] = [Group::Ba, Group::Design, Group::Dev];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ba => "ba",
            Self::Design => "design",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ba" => Ok(Self::Ba),
            "design" => Ok(Self::Design),
            "dev" => Ok(Self::Dev),
            _ => Err(format!("Invalid group: {}", s)),
        }
    }
}

/// One of the five required artifacts an initiative progresses through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Prd,
    Ux,
    Architecture,
    EpicsStories,
    Readiness,
}

impl ArtifactKind {
    /// Progression order. `current_step` only ever moves forward through
    /// this sequence.
    pub const ORDER: [ArtifactKind; 5] = [
        ArtifactKind::Prd,
        ArtifactKind::Ux,
        ArtifactKind::Architecture,
        ArtifactKind::EpicsStories,
        ArtifactKind::Readiness,
    ];

    /// The first step of every initiative.
    pub fn first() -> ArtifactKind {
        Self::ORDER[0]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prd => "prd",
            Self::Ux => "ux",
            Self::Architecture => "architecture",
            Self::EpicsStories => "epics_stories",
            Self::Readiness => "readiness",
        }
    }

    /// The groups that must sign off on this artifact, in stable catalog
    /// order. Never empty.
    pub fn required_groups(&self) -> &'static [Group] {
        match self {
            Self::Prd => &[Group::Ba, Group::Design, Group::Dev],
            Self::Ux => &[Group::Ba, Group::Design],
            Self::Architecture => &[Group::Dev],
            Self::EpicsStories => &[Group::Ba, Group::Dev],
            Self::Readiness => &[Group::Ba, Group::Design, Group::Dev],
        }
    }

    /// Canonical artifact file name inside the initiative's artifacts
    /// directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Prd => "PRD.md",
            Self::Ux => "UX.md",
            Self::Architecture => "ARCHITECTURE.md",
            Self::EpicsStories => "EPICS_AND_STORIES.md",
            Self::Readiness => "IMPLEMENTATION_READINESS.md",
        }
    }

    /// Branch-name suffix. Note: `epics_stories` uses a hyphen on the
    /// branch, matching the review-branch convention.
    pub fn branch_suffix(&self) -> &'static str {
        match self {
            Self::Prd => "prd",
            Self::Ux => "ux",
            Self::Architecture => "architecture",
            Self::EpicsStories => "epics-stories",
            Self::Readiness => "readiness",
        }
    }

    /// Suggested review branch for this artifact of the given initiative.
    pub fn branch_name(&self, key: &str) -> String {
        format!("bmad/{}/{}", key, self.branch_suffix())
    }

    /// Zero-based position in the progression order.
    pub fn position(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|k| k == self)
            .unwrap_or_default()
    }

    /// The step after this one, or `None` for the final step.
    pub fn next(&self) -> Option<ArtifactKind> {
        Self::ORDER.get(self.position() + 1).copied()
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prd" => Ok(Self::Prd),
            "ux" => Ok(Self::Ux),
            "architecture" => Ok(Self::Architecture),
            "epics_stories" => Ok(Self::EpicsStories),
            "readiness" => Ok(Self::Readiness),
            _ => Err(format!("Invalid artifact: {}", s)),
        }
    }
}

/// Render the full progression chain, e.g. for status output:
/// `prd -> ux -> architecture -> epics_stories -> readiness`.
pub fn step_chain() -> String {
    ArtifactKind::ORDER
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
