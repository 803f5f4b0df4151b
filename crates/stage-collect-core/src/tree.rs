//! Delivery tree rendering in the style of `tree /F`.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classifier::path_segments;
use crate::error::Result;

#[derive(Debug, Default)]
struct Node {
    files: BTreeSet<String>,
    dirs: BTreeMap<String, Node>,
}

impl Node {
    fn dir_mut(&mut self, segments: &[&OsStr]) -> &mut Node {
        segments.iter().fold(self, |node, segment| {
            node.dirs
                .entry(segment.to_string_lossy().into_owned())
                .or_default()
        })
    }

    fn insert_file(&mut self, relative: &Path) {
        let segments = path_segments(relative);
        if let Some((file, dirs)) = segments.split_last() {
            self.dir_mut(dirs)
                .files
                .insert(file.to_string_lossy().into_owned());
        }
    }

    fn insert_dir(&mut self, relative: &Path) {
        self.dir_mut(&path_segments(relative));
    }

    fn render(&self, indent: &str, out: &mut String) {
        let total = self.files.len() + self.dirs.len();
        let mut index = 0;

        for file in &self.files {
            index += 1;
            let connector = if index == total { "└── " } else { "├── " };
            out.push_str(&format!("{}{}{}\n", indent, connector, file));
        }

        for (name, child) in &self.dirs {
            index += 1;
            let last = index == total;
            let connector = if last { "└── " } else { "├── " };
            out.push_str(&format!("{}{}{}\n", indent, connector, name));

            let child_indent = format!("{}{}", indent, if last { "    " } else { "│   " });
            child.render(&child_indent, out);
        }
    }
}

/// Render the directory tree under `root` (files before directories, each sorted by name).
pub fn render_tree(root: &Path) -> Result<String> {
    let mut node = Node::default();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if entry.file_type().is_dir() {
            node.insert_dir(relative);
        } else {
            node.insert_file(relative);
        }
    }

    let mut out = format!("{}\n", root.display());
    node.render("", &mut out);
    Ok(out)
}

/// Render a tree from paths relative to a root labelled `label`.
pub fn render_paths(label: &str, paths: &[PathBuf]) -> String {
    let mut node = Node::default();
    for path in paths {
        node.insert_file(path);
    }

    let mut out = format!("{}\n", label);
    node.render("", &mut out);
    out
}
