//! Stage Store
//!
//! 工程ルールのランタイムストア。
//! ビルトインと設定ファイルの`[stages]`から構築する。

use std::collections::BTreeMap;

use serde::Deserialize;

use super::builtin::{StageRule, BUILTIN_STAGES};
use crate::error::Result;

/// 工程ルールのランタイムストア
#[derive(Debug, Clone)]
pub struct StageStore {
    stages: BTreeMap<String, StageRule>,
}

impl StageStore {
    /// ビルトイン工程のみで初期化
    pub fn builtin() -> Self {
        let stages = BUILTIN_STAGES
            .iter()
            .map(|b| (b.name.to_string(), StageRule::from(b)))
            .collect();
        Self { stages }
    }

    /// 設定ファイルの工程のみで初期化
    pub fn from_config(config: &StagesConfig) -> Result<Self> {
        Self {
            stages: BTreeMap::new(),
        }
        .with_config(config)
    }

    /// 設定でオーバーライド
    ///
    /// - 同名工程は上書き
    /// - 新規工程は追加
    pub fn with_config(mut self, config: &StagesConfig) -> Result<Self> {
        for (name, entry) in &config.stages {
            let rule = StageRule::new(
                name.clone(),
                entry.top_level.clone(),
                entry.artifact.clone(),
            )?;
            self.stages.insert(name.clone(), rule);
        }
        Ok(self)
    }

    /// 工程ルールを取得（未設定の工程は`None`）
    pub fn get(&self, name: &str) -> Option<&StageRule> {
        self.stages.get(name)
    }

    /// 全工程（名前順）
    pub fn all(&self) -> Vec<&StageRule> {
        self.stages.values().collect()
    }

    /// 工程名一覧
    pub fn names(&self) -> Vec<&str> {
        self.stages.keys().map(|s| s.as_str()).collect()
    }

}

impl Default for StageStore {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 設定ファイルの`[stages]`セクション
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StagesConfig {
    #[serde(flatten)]
    pub stages: BTreeMap<String, StageConfigEntry>,
}

impl StagesConfig {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// 個別工程の設定エントリ
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfigEntry {
    /// 工程フォルダ直下にコピーするファイルのプレフィックス
    #[serde(default)]
    pub top_level: Vec<String>,
    /// 成果物フォルダにコピーするファイルのプレフィックス
    #[serde(default)]
    pub artifact: Vec<String>,
}
