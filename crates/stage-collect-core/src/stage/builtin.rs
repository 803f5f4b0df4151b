//! Builtin Stage Definitions
//!
//! コード内で定義されるビルトイン工程フォルダ。
//! 設定ファイルに`[stages]`が無い場合に使用される。

use crate::error::{Result, StageCollectError};

/// 成果物フォルダのデフォルト名
pub const DEFAULT_ARTIFACT_DIR: &str = "artifact";

/// ビルトイン工程定義
pub const BUILTIN_STAGES: &[BuiltinStage] = &[
    BuiltinStage {
        name: "010.調査",
        top_level: &["調査検討書_"],
        artifact: &["010_レビューチェックリスト_", "レビュー記録表_調査_"],
    },
    BuiltinStage {
        name: "020.設計",
        top_level: &["機能設計書_"],
        artifact: &["020_レビューチェックリスト_", "レビュー記録表_設計_"],
    },
    BuiltinStage {
        name: "030.UD作成",
        top_level: &["単体試験仕様書_"],
        artifact: &["030_レビューチェックリスト_", "レビュー記録表_UD作成_"],
    },
];

/// ビルトイン工程の静的定義
#[derive(Debug, Clone)]
pub struct BuiltinStage {
    /// 工程フォルダ名（一意識別子）
    pub name: &'static str,
    /// 工程フォルダ直下にコピーするファイルのプレフィックス（宣言順に評価）
    pub top_level: &'static [&'static str],
    /// 成果物フォルダにコピーするファイルのプレフィックス（宣言順に評価）
    pub artifact: &'static [&'static str],
}

/// ランタイム工程ルール
///
/// ビルトインまたは設定ファイルの`[stages]`から構築され、以後変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRule {
    name: String,
    top_level: Vec<String>,
    artifact: Vec<String>,
}

impl StageRule {
    /// 存在チェックのみ行って工程ルールを構築
    ///
    /// - 工程名は空でなく、パス区切りを含まない単一のフォルダ名であること
    /// - プレフィックスは空文字列でないこと（空文字列は全ファイルに一致してしまう）
    pub fn new(
        name: impl Into<String>,
        top_level: Vec<String>,
        artifact: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(StageCollectError::InvalidStage {
                name,
                reason: "stage name is empty".to_string(),
            });
        }
        if name.contains('/') || name.contains('\\') {
            return Err(StageCollectError::InvalidStage {
                name,
                reason: "stage name must be a single folder name".to_string(),
            });
        }
        if top_level.iter().chain(artifact.iter()).any(|p| p.is_empty()) {
            return Err(StageCollectError::InvalidStage {
                name,
                reason: "prefixes must not be empty".to_string(),
            });
        }

        Ok(Self {
            name,
            top_level,
            artifact,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn top_level(&self) -> &[String] {
        &self.top_level
    }

    pub fn artifact(&self) -> &[String] {
        &self.artifact
    }

    /// 工程フォルダ直下のファイル名に一致する最初のプレフィックス
    pub fn match_top_level(&self, file_name: &str) -> Option<&str> {
        first_prefix_match(&self.top_level, file_name)
    }

    /// 成果物フォルダ配下のファイル名に一致する最初のプレフィックス
    pub fn match_artifact(&self, file_name: &str) -> Option<&str> {
        first_prefix_match(&self.artifact, file_name)
    }
}

impl From<&BuiltinStage> for StageRule {
    fn from(builtin: &BuiltinStage) -> Self {
        Self {
            name: builtin.name.to_string(),
            top_level: builtin.top_level.iter().map(|s| s.to_string()).collect(),
            artifact: builtin.artifact.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Case-insensitive "starts with"; the first prefix in declaration order wins.
fn first_prefix_match<'a>(prefixes: &'a [String], file_name: &str) -> Option<&'a str> {
    let file_lower = file_name.to_lowercase();
    prefixes
        .iter()
        .find(|p| file_lower.starts_with(&p.to_lowercase()))
        .map(|p| p.as_str())
}
