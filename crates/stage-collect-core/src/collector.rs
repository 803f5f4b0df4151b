use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::classifier::{Classifier, Placement};
use crate::copy::copy_file_atomic;
use crate::error::{Result, StageCollectError};
use crate::stage::{StageStore, DEFAULT_ARTIFACT_DIR};

/// Callback type for per-file progress reporting
pub type CopyCallback<'a> = Option<&'a dyn Fn(&CopyEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    /// File was copied to its destination
    Copied,
    /// Destination already existed; nothing was written
    Exists,
    /// Dry run: file would have been copied
    Planned,
}

impl CopyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Copied => "COPY",
            Self::Exists => "EXISTS",
            Self::Planned => "PLAN",
        }
    }
}

/// One classified file and what happened to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEvent {
    pub status: CopyStatus,
    pub stage: String,
    pub placement: Placement,
    pub file_name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl CopyEvent {
    /// Destination path relative to the destination root
    pub fn relative_destination(&self, dest_root: &Path) -> PathBuf {
        self.destination
            .strip_prefix(dest_root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| self.destination.clone())
    }
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Name of the artifact folder, both in the source tree and in the destination
    pub artifact_dir: String,
    /// Optional glob applied to file names after classification
    pub file_pattern: Option<String>,
    pub dry_run: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            artifact_dir: DEFAULT_ARTIFACT_DIR.to_string(),
            file_pattern: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct CollectResult {
    pub copied: usize,
    pub existing: usize,
    pub planned: usize,
    /// Files under the source root that matched no rule
    pub unmatched: usize,
    /// Files that matched a rule but not the file pattern
    pub filtered: usize,
    pub events: Vec<CopyEvent>,
}

impl CollectResult {
    fn record(&mut self, event: CopyEvent) {
        match event.status {
            CopyStatus::Copied => self.copied += 1,
            CopyStatus::Exists => self.existing += 1,
            CopyStatus::Planned => self.planned += 1,
        }
        self.events.push(event);
    }
}

/// Walks a source tree and copies stage deliverables into a destination tree.
pub struct Collector<'a> {
    classifier: Classifier<'a>,
    file_pattern: Option<Pattern>,
    dry_run: bool,
}

impl<'a> Collector<'a> {
    pub fn new(store: &'a StageStore, options: &CollectOptions) -> Result<Self> {
        let file_pattern = options
            .file_pattern
            .as_deref()
            .map(Pattern::new)
            .transpose()?;

        Ok(Self {
            classifier: Classifier::new(store, options.artifact_dir.clone()),
            file_pattern,
            dry_run: options.dry_run,
        })
    }

    /// Single-pass depth-first walk of `source`, copying every classified file.
    ///
    /// Any filesystem error aborts the run; files copied before the error stay
    /// in place and are skipped on the next run.
    pub fn collect(
        &self,
        source: &Path,
        dest: &Path,
        on_copy: CopyCallback<'_>,
    ) -> Result<CollectResult> {
        if !source.exists() {
            return Err(StageCollectError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }
        if !source.is_dir() {
            return Err(StageCollectError::SourceNotDirectory {
                path: source.to_path_buf(),
            });
        }

        if !self.dry_run {
            fs::create_dir_all(dest)?;
        }

        let mut result = CollectResult::default();

        // Never descend into the destination when it lives inside the source.
        // Compared canonically so `-s . -d out` still matches `./out`.
        let dest_canonical = fs::canonicalize(dest).ok();
        let walker = WalkDir::new(source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || dest_canonical.is_none()
                    || fs::canonicalize(e.path()).ok() != dest_canonical
            });

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }

            let src = entry.path();
            let relative_dir = src
                .parent()
                .and_then(|p| p.strip_prefix(source).ok())
                .unwrap_or_else(|| Path::new(""));
            let file_name = entry.file_name().to_string_lossy();

            let decisions = self.classifier.classify(relative_dir, &file_name);
            if decisions.is_empty() {
                result.unmatched += 1;
                continue;
            }

            if !self.matches_pattern(&file_name) {
                result.filtered += 1;
                continue;
            }

            for decision in decisions {
                let dst_dir = self.classifier.destination_dir(dest, &decision);
                let dst = dst_dir.join(entry.file_name());

                let status = if dst.exists() {
                    CopyStatus::Exists
                } else if self.dry_run {
                    CopyStatus::Planned
                } else {
                    fs::create_dir_all(&dst_dir)?;
                    if copy_file_atomic(src, &dst)? {
                        CopyStatus::Copied
                    } else {
                        CopyStatus::Exists
                    }
                };

                let event = CopyEvent {
                    status,
                    stage: decision.stage.to_string(),
                    placement: decision.placement,
                    file_name: file_name.to_string(),
                    source: src.to_path_buf(),
                    destination: dst,
                };
                if let Some(f) = on_copy {
                    f(&event);
                }
                result.record(event);
            }
        }

        Ok(result)
    }

    fn matches_pattern(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        self.file_pattern
            .as_ref()
            .map(|p| p.matches_with(file_name, options))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use filetime::FileTime;

    use super::*;
    use crate::stage::{StageConfigEntry, StagesConfig};

    fn store(entries: &[(&str, &[&str], &[&str])]) -> StageStore {
        let config = StagesConfig {
            stages: entries
                .iter()
                .map(|(name, top, art)| {
                    (
                        name.to_string(),
                        StageConfigEntry {
                            top_level: top.iter().map(|s| s.to_string()).collect(),
                            artifact: art.iter().map(|s| s.to_string()).collect(),
                        },
                    )
                })
                .collect(),
        };
        StageStore::from_config(&config).unwrap()
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "S/A_report.txt", "top");
        write(&src, "S/notes.txt", "ignored");
        write(&src, "S/artifact/anything/B_check.txt", "artifact");
        write(&src, "S/artifact/C_other.txt", "ignored");
        write(&src, "unknown/X.txt", "ignored");
        write(&src, "root.txt", "ignored");
        (tmp, src, dst)
    }

    #[test]
    fn collect_copies_top_level_and_flattened_artifacts() {
        let (_tmp, src, dst) = fixture();
        let store = store(&[("S", &["A_"], &["B_"]), ("unknown_stage", &["X"], &[])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let result = collector.collect(&src, &dst, None).unwrap();

        assert_eq!(result.copied, 2);
        assert_eq!(fs::read_to_string(dst.join("S/A_report.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(dst.join("S/artifact/B_check.txt")).unwrap(),
            "artifact"
        );
        assert!(!dst.join("S/notes.txt").exists());
        assert!(!dst.join("S/artifact/C_other.txt").exists());
        assert!(!dst.join("S/artifact/anything").exists());
        assert!(!dst.join("unknown").exists());
        assert_eq!(result.unmatched, 4);
    }

    #[test]
    fn collect_is_case_insensitive() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "S/a_report.TXT", "x");
        let store = store(&[("S", &["A_"], &[])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        collector.collect(&src, &dst, None).unwrap();

        assert!(dst.join("S/a_report.TXT").exists());
    }

    #[test]
    fn collect_rerun_does_not_touch_existing_files() {
        let (_tmp, src, dst) = fixture();
        let store = store(&[("S", &["A_"], &["B_"])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();
        collector.collect(&src, &dst, None).unwrap();

        let copied = dst.join("S/A_report.txt");
        let pinned = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&copied, pinned).unwrap();
        fs::write(src.join("S/A_report.txt"), "changed in source").unwrap();

        let result = collector.collect(&src, &dst, None).unwrap();

        assert_eq!(result.copied, 0);
        assert_eq!(result.existing, 2);
        let meta = fs::metadata(&copied).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), pinned);
        assert_eq!(fs::read_to_string(&copied).unwrap(), "top");
    }

    #[test]
    fn collect_file_matching_both_rules_lands_twice() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "artifact/X_both.txt", "both");
        let store = store(&[("artifact", &["X_"], &["X_"])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let result = collector.collect(&src, &dst, None).unwrap();

        assert_eq!(result.copied, 2);
        assert!(dst.join("artifact/X_both.txt").exists());
        assert!(dst.join("artifact/artifact/X_both.txt").exists());
    }

    #[test]
    fn collect_reports_each_copy_through_callback() {
        let (_tmp, src, dst) = fixture();
        let store = store(&[("S", &["A_"], &["B_"])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let seen = RefCell::new(Vec::new());
        let on_copy = |event: &CopyEvent| {
            seen.borrow_mut()
                .push((event.status, event.file_name.clone(), event.placement));
        };
        collector.collect(&src, &dst, Some(&on_copy)).unwrap();

        assert_eq!(
            seen.into_inner(),
            vec![
                (CopyStatus::Copied, "A_report.txt".to_string(), Placement::TopLevel),
                (CopyStatus::Copied, "B_check.txt".to_string(), Placement::Artifact),
            ]
        );
    }

    #[test]
    fn collect_dry_run_writes_nothing() {
        let (_tmp, src, dst) = fixture();
        let store = store(&[("S", &["A_"], &["B_"])]);
        let options = CollectOptions {
            dry_run: true,
            ..CollectOptions::default()
        };
        let collector = Collector::new(&store, &options).unwrap();

        let result = collector.collect(&src, &dst, None).unwrap();

        assert_eq!(result.planned, 2);
        assert_eq!(result.copied, 0);
        assert!(!dst.exists());
    }

    #[test]
    fn collect_applies_file_pattern() {
        let (_tmp, src, dst) = fixture();
        let store = store(&[("S", &["A_"], &["B_"])]);
        let options = CollectOptions {
            file_pattern: Some("*.TXT".to_string()),
            ..CollectOptions::default()
        };
        let collector = Collector::new(&store, &options).unwrap();
        assert_eq!(collector.collect(&src, &dst, None).unwrap().copied, 2);

        let options = CollectOptions {
            file_pattern: Some("A_*".to_string()),
            ..CollectOptions::default()
        };
        let other_dst = dst.with_file_name("dst2");
        let collector = Collector::new(&store, &options).unwrap();
        let result = collector.collect(&src, &other_dst, None).unwrap();
        assert_eq!(result.copied, 1);
        assert_eq!(result.filtered, 1);
        assert!(!other_dst.join("S/artifact").exists());
    }

    #[test]
    fn collect_custom_artifact_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "010.調査/成果物/内部/レビュー記録表_調査_1.xlsx", "r");
        let store = StageStore::builtin();
        let options = CollectOptions {
            artifact_dir: "成果物".to_string(),
            ..CollectOptions::default()
        };
        let collector = Collector::new(&store, &options).unwrap();

        collector.collect(&src, &dst, None).unwrap();

        assert!(dst.join("010.調査/成果物/レビュー記録表_調査_1.xlsx").exists());
    }

    #[test]
    fn collect_skips_destination_nested_in_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().to_path_buf();
        let dst = src.join("S");
        write(&src, "S/A_report.txt", "x");
        let store = store(&[("S", &["A_"], &[])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let result = collector.collect(&src, &dst, None).unwrap();

        assert_eq!(result.copied, 0);
    }

    #[cfg(unix)]
    #[test]
    fn collect_skips_destination_reached_through_another_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        write(&src, "S/A_report.txt", "x");
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&src, &link).unwrap();
        let store = store(&[("S", &["A_"], &[])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let result = collector.collect(&link, &src.join("S"), None).unwrap();

        assert_eq!(result.copied, 0);
        assert!(!src.join("S/S").exists());
    }

    #[cfg(unix)]
    #[test]
    fn collect_ignores_files_misplaced_by_non_utf8_folders() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let junk = OsStr::from_bytes(b"\xffjunk");
        for dir in [src.join(junk).join("S"), src.join("S").join(junk)] {
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("A_x.txt"), "x").unwrap();
        }
        let store = store(&[("S", &["A_"], &[])]);
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let result = collector.collect(&src, &dst, None).unwrap();

        assert_eq!(result.copied, 0);
        assert_eq!(result.unmatched, 2);
        assert!(!dst.join("S/A_x.txt").exists());
    }

    #[test]
    fn collect_missing_source_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = StageStore::builtin();
        let collector = Collector::new(&store, &CollectOptions::default()).unwrap();

        let err = collector
            .collect(&tmp.path().join("missing"), &tmp.path().join("dst"), None)
            .unwrap_err();
        assert!(matches!(err, StageCollectError::SourceNotFound { .. }));
    }

    #[test]
    fn invalid_file_pattern_is_rejected() {
        let store = StageStore::builtin();
        let options = CollectOptions {
            file_pattern: Some("[".to_string()),
            ..CollectOptions::default()
        };
        assert!(matches!(
            Collector::new(&store, &options),
            Err(StageCollectError::InvalidPattern(_))
        ));
    }
}
