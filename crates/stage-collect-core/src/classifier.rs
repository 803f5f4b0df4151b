//! File classifier
//!
//! ソースツリー上のファイル位置とファイル名から、どの工程のどの配置
//! （工程直下 / 成果物）にコピーすべきかを判定する。

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::stage::{StageRule, StageStore};

/// コピー先の配置区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `<dest>/<stage>/` 直下
    TopLevel,
    /// `<dest>/<stage>/<artifact_dir>/`（ソース側の階層は平坦化）
    Artifact,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevel => write!(f, "top"),
            Self::Artifact => write!(f, "artifact"),
        }
    }
}

/// 1ファイル分の分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyDecision<'a> {
    pub stage: &'a str,
    pub placement: Placement,
    pub prefix: &'a str,
}

/// 工程ストアと成果物フォルダ名に基づく分類器
pub struct Classifier<'a> {
    store: &'a StageStore,
    artifact_dir: String,
}

impl<'a> Classifier<'a> {
    pub fn new(store: &'a StageStore, artifact_dir: impl Into<String>) -> Self {
        Self {
            store,
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Active stage for a directory: its first segment, if configured.
    ///
    /// Non-UTF-8 segments never name a stage.
    pub fn stage_for(&self, segments: &[&OsStr]) -> Option<&'a StageRule> {
        segments
            .first()
            .and_then(|first| first.to_str())
            .and_then(|first| self.store.get(first))
    }

    /// Classify `file_name` located in `relative_dir` (relative to the source root).
    ///
    /// Top-level and artifact placements are evaluated independently, so a
    /// file can yield up to two decisions. An empty result means "do not copy".
    pub fn classify(&self, relative_dir: &Path, file_name: &str) -> Vec<CopyDecision<'a>> {
        let segments = path_segments(relative_dir);
        let Some(stage) = self.stage_for(&segments) else {
            return Vec::new();
        };

        let mut decisions = Vec::with_capacity(2);

        if segments.len() == 1 {
            if let Some(prefix) = stage.match_top_level(file_name) {
                decisions.push(CopyDecision {
                    stage: stage.name(),
                    placement: Placement::TopLevel,
                    prefix,
                });
            }
        }

        let artifact_dir = OsStr::new(&self.artifact_dir);
        if segments.iter().any(|s| *s == artifact_dir) {
            if let Some(prefix) = stage.match_artifact(file_name) {
                decisions.push(CopyDecision {
                    stage: stage.name(),
                    placement: Placement::Artifact,
                    prefix,
                });
            }
        }

        decisions
    }

    /// Destination directory for a decision under `dest_root`.
    pub fn destination_dir(&self, dest_root: &Path, decision: &CopyDecision<'_>) -> PathBuf {
        let stage_dir = dest_root.join(decision.stage);
        match decision.placement {
            Placement::TopLevel => stage_dir,
            Placement::Artifact => stage_dir.join(&self.artifact_dir),
        }
    }
}

/// Split a relative path into its normal segments (`.` and empty paths yield none).
///
/// Segments stay `OsStr` so that a non-UTF-8 folder still occupies its slot.
pub fn path_segments(relative: &Path) -> Vec<&OsStr> {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect()
}
