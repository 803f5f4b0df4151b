pub mod classifier;
pub mod collector;
pub mod config;
pub mod copy;
pub mod error;
pub mod stage;
pub mod tree;

pub use classifier::{path_segments, Classifier, CopyDecision, Placement};
pub use collector::{
    CollectOptions, CollectResult, Collector, CopyCallback, CopyEvent, CopyStatus,
};
pub use config::{Config, GeneralConfig, CONFIG_FILE, ITEM_NAME_PLACEHOLDER};
pub use copy::copy_file_atomic;
pub use error::{Result, StageCollectError};
pub use stage::{
    BuiltinStage, StageConfigEntry, StageRule, StageStore, StagesConfig, BUILTIN_STAGES,
    DEFAULT_ARTIFACT_DIR,
};
pub use tree::{render_paths, render_tree};
