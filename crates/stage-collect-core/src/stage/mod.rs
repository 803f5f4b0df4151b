//! # Stage Module
//!
//! 工程フォルダ名（例: `010.調査`）からファイル名マッチングルールを解決する。
//!
//! 各工程は2つの順序付きプレフィックスリストを持つ:
//!
//! - **top_level**: 工程フォルダ直下に置かれる納品物
//! - **artifact**: 成果物フォルダ配下に置かれるレビュー記録等
//!
//! ## 使用例
//!
//! ```rust
//! use stage_collect_core::stage::StageStore;
//!
//! let store = StageStore::builtin();
//! let stage = store.get("010.調査").unwrap();
//! assert_eq!(stage.match_top_level("調査検討書_v1.xlsx"), Some("調査検討書_"));
//! assert!(store.get("999.unknown").is_none());
//! ```

mod builtin;
mod store;

pub use builtin::{BuiltinStage, StageRule, BUILTIN_STAGES, DEFAULT_ARTIFACT_DIR};
pub use store::{StageConfigEntry, StageStore, StagesConfig};
