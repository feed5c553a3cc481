use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::metadata::{AnalysisResult, MetadataTree, MetadataValue};

/// Text shown in place of the tree when the service found nothing.
pub const NO_METADATA: &str = "No metadata found in this file";
/// MIME type label used when the service could not determine one.
pub const UNKNOWN_MIME: &str = "Unknown";

/// One rendered line of a metadata tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// Header of a nested mapping; its children follow at `depth + 1`.
    Group { key: String, depth: usize },
    /// A key/value pair.
    Leaf {
        key: String,
        value: String,
        depth: usize,
    },
}

impl Row {
    pub fn depth(&self) -> usize {
        match self {
            Row::Group { depth, .. } | Row::Leaf { depth, .. } => *depth,
        }
    }
}

/// Body of the result panel for a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataView {
    Empty,
    Tree(Vec<Row>),
}

/// A successful analysis, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAnalysis {
    pub title: String,
    pub filename: String,
    pub mimetype: String,
    pub body: MetadataView,
}

pub fn render_analysis(result: &AnalysisResult) -> RenderedAnalysis {
    let body = if result.metadata.is_empty() {
        MetadataView::Empty
    } else {
        MetadataView::Tree(render_metadata(&result.metadata, 0))
    };

    RenderedAnalysis {
        title: format!("Analysis: {}", result.filename),
        filename: result.filename.clone(),
        mimetype: result
            .mimetype
            .clone()
            .unwrap_or_else(|| UNKNOWN_MIME.to_string()),
        body,
    }
}

/// Flatten a metadata tree into display rows, starting at `level`.
///
/// Recursion depth equals the nesting depth of the data.
pub fn render_metadata(tree: &MetadataTree, level: usize) -> Vec<Row> {
    let mut rows = Vec::with_capacity(tree.len());
    push_rows(tree, level, &mut rows);
    rows
}

fn push_rows(tree: &MetadataTree, level: usize, rows: &mut Vec<Row>) {
    for (key, value) in tree.iter() {
        match value {
            MetadataValue::Node(child) => {
                rows.push(Row::Group {
                    key: key.to_string(),
                    depth: level,
                });
                push_rows(child, level + 1, rows);
            }
            MetadataValue::Leaf(scalar) => rows.push(Row::Leaf {
                key: key.to_string(),
                value: scalar.to_string(),
                depth: level,
            }),
        }
    }
}

/// Spaces of indentation per nesting level.
const INDENT_STEP: usize = 2;
/// Narrowest value column before the layout stops shrinking it.
const MIN_VALUE_WIDTH: usize = 8;

/// Lay rows out as plain text at most `width` columns wide.
///
/// Groups are prefixed with `▾`. Leaf values are right-aligned and broken
/// at any character once they exceed the space left after the key. A key
/// too wide to leave `MIN_VALUE_WIDTH` columns gets a line of its own and
/// the value continues below it, one level deeper. Indentation stops
/// growing once it would leave less than `MIN_VALUE_WIDTH` columns.
pub fn layout_rows(rows: &[Row], width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for row in rows {
        let indent_width = indent_columns(row.depth(), width);
        let indent = " ".repeat(indent_width);
        let room = width.saturating_sub(indent_width);
        match row {
            Row::Group { key, .. } => {
                for piece in wrap_anywhere(&format!("▾ {key}"), room) {
                    lines.push(format!("{indent}{piece}"));
                }
            }
            Row::Leaf { key, value, .. } => {
                let label = format!("{key}: ");
                let label_width = label.chars().count();

                if label_width + MIN_VALUE_WIDTH <= room {
                    let value_width = room - label_width;
                    let chunks = wrap_anywhere(value, value_width);
                    for (i, chunk) in chunks.iter().enumerate() {
                        let lead = if i == 0 {
                            label.clone()
                        } else {
                            " ".repeat(label_width)
                        };
                        lines.push(format!("{indent}{lead}{chunk:>value_width$}"));
                    }
                } else {
                    for piece in wrap_anywhere(label.trim_end(), room) {
                        lines.push(format!("{indent}{piece}"));
                    }
                    let value_indent = indent_columns(row.depth() + 1, width);
                    let value_width = width.saturating_sub(value_indent);
                    let lead = " ".repeat(value_indent);
                    for chunk in wrap_anywhere(value, value_width) {
                        lines.push(format!("{lead}{chunk:>value_width$}"));
                    }
                }
            }
        }
    }

    lines
}

fn indent_columns(depth: usize, width: usize) -> usize {
    (depth * INDENT_STEP).min(width.saturating_sub(MIN_VALUE_WIDTH))
}

/// Split `s` into pieces of at most `max_width` characters, ignoring word
/// boundaries. Always yields at least one (possibly empty) piece.
fn wrap_anywhere(s: &str, max_width: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Binary payload of a removal, named for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Destination for downloaded artifacts.
pub trait DownloadSink: Send + Sync {
    /// Save the artifact and return where it ended up.
    fn save(&self, artifact: &DownloadArtifact) -> Result<PathBuf>;
}

/// Saves artifacts into a directory.
///
/// The payload is first written to a temporary file in the target directory,
/// then persisted under the artifact's name. Existing files are never
/// replaced: a taken name is retried as `name (1).ext`, `name (2).ext` and so
/// on. The temporary handle is dropped once the persist has been attempted,
/// whether or not it succeeded.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, artifact: &DownloadArtifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let mut transient =
            NamedTempFile::new_in(&self.dir).context("Failed to create download buffer")?;
        transient
            .write_all(&artifact.bytes)
            .context("Failed to write download buffer")?;

        // Only the file name is used so a hostile name cannot escape the dir.
        let name = Path::new(&artifact.filename)
            .file_name()
            .map(Path::new)
            .context("Download has no usable file name")?;

        let mut attempt = 0;
        loop {
            let target = self.dir.join(numbered(name, attempt));
            match transient.persist_noclobber(&target) {
                Ok(_) => {
                    log::info!("Saved {}", target.display());
                    return Ok(target);
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("{} exists, trying the next name", target.display());
                    transient = e.file;
                    attempt += 1;
                }
                Err(e) => {
                    // e.file is the still-open temp file; dropping it removes it.
                    drop(e.file);
                    return Err(anyhow::Error::new(e.error)
                        .context(format!("Failed to save {}", target.display())));
                }
            }
        }
    }
}

/// `name` for the first attempt, then `stem (n).ext`.
fn numbered(name: &Path, attempt: usize) -> PathBuf {
    if attempt == 0 {
        return name.to_path_buf();
    }
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match name.extension() {
        Some(ext) => PathBuf::from(format!("{stem} ({attempt}).{}", ext.to_string_lossy())),
        None => PathBuf::from(format!("{stem} ({attempt})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Scalar;
    use serde_json::json;
    use tempfile::TempDir;

    fn analysis(metadata: serde_json::Value) -> AnalysisResult {
        AnalysisResult {
            filename: "photo.jpg".into(),
            mimetype: None,
            metadata: MetadataTree::from(metadata),
        }
    }

    #[test]
    fn empty_metadata_renders_empty_state() {
        let rendered = render_analysis(&analysis(json!({})));
        assert_eq!(rendered.body, MetadataView::Empty);
        assert_eq!(rendered.mimetype, "Unknown");
        assert_eq!(rendered.title, "Analysis: photo.jpg");
    }

    #[test]
    fn nested_metadata_rows() {
        let rendered = render_analysis(&analysis(json!({
            "Author": "Alice",
            "GPS": { "lat": 1.23, "lon": 4.56 }
        })));
        let MetadataView::Tree(rows) = rendered.body else {
            panic!("expected a tree");
        };
        assert_eq!(
            rows,
            vec![
                Row::Leaf { key: "Author".into(), value: "Alice".into(), depth: 0 },
                Row::Group { key: "GPS".into(), depth: 0 },
                Row::Leaf { key: "lat".into(), value: "1.23".into(), depth: 1 },
                Row::Leaf { key: "lon".into(), value: "4.56".into(), depth: 1 },
            ]
        );
    }

    #[test]
    fn deep_nesting_is_rendered() {
        let mut tree = MetadataTree::new();
        tree.insert("leaf", MetadataValue::Leaf(Scalar::Bool(false)));
        for i in (0..40).rev() {
            let mut parent = MetadataTree::new();
            parent.insert(format!("level{i}"), MetadataValue::Node(tree));
            tree = parent;
        }
        let rows = render_metadata(&tree, 0);
        assert_eq!(rows.len(), 41);
        assert_eq!(rows.last().map(Row::depth), Some(40));
        // Indentation grows with depth.
        assert!(rows.windows(2).all(|w| w[1].depth() == w[0].depth() + 1));
    }

    #[test]
    fn layout_indents_and_right_aligns() {
        let rows = vec![
            Row::Group { key: "GPS".into(), depth: 0 },
            Row::Leaf { key: "lat".into(), value: "1.23".into(), depth: 1 },
        ];
        let lines = layout_rows(&rows, 20);
        assert_eq!(lines[0], "▾ GPS");
        assert!(lines[1].starts_with("  lat: "));
        assert!(lines[1].ends_with("1.23"));
        assert_eq!(lines[1].chars().count(), 20);
    }

    #[test]
    fn long_values_wrap_without_overflow() {
        let value = "A".repeat(100);
        let rows = vec![Row::Leaf { key: "Blob".into(), value, depth: 0 }];
        let lines = layout_rows(&rows, 30);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
        let rejoined: String = lines.iter().map(|l| l.trim_start_matches("Blob: ").trim()).collect();
        assert_eq!(rejoined, "A".repeat(100));
    }

    #[test]
    fn long_key_moves_value_to_its_own_lines() {
        let key = "K".repeat(60);
        let rows = vec![Row::Leaf {
            key: key.clone(),
            value: "v".repeat(40),
            depth: 3,
        }];
        let lines = layout_rows(&rows, 70);
        assert!(lines.iter().all(|l| l.chars().count() <= 70));
        assert_eq!(lines[0], format!("      {key}:"));
        assert_eq!(lines[1].trim_start(), "v".repeat(40));
        assert!(lines[1].starts_with("        "));
    }

    #[test]
    fn deep_nesting_stays_within_width() {
        let mut rows = Vec::new();
        for depth in 0..40 {
            rows.push(Row::Group { key: format!("level{depth}"), depth });
        }
        rows.push(Row::Leaf {
            key: "Comment".into(),
            value: "w".repeat(120),
            depth: 40,
        });
        rows.push(Row::Leaf { key: "x".repeat(90), value: "1".into(), depth: 40 });

        let width = 70;
        let lines = layout_rows(&rows, width);
        assert!(lines.iter().all(|l| l.chars().count() <= width));
        // Nothing is dropped when the indent is capped.
        let ws: usize = lines.iter().map(|l| l.matches('w').count()).sum();
        assert_eq!(ws, 120);
    }

    #[test]
    fn wrap_anywhere_splits_mid_word() {
        assert_eq!(wrap_anywhere("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_anywhere("", 4), vec![""]);
    }

    #[test]
    fn directory_sink_saves_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());
        let artifact = DownloadArtifact {
            filename: "cleaned_photo.jpg".into(),
            bytes: b"clean".to_vec(),
        };

        let saved = sink.save(&artifact).unwrap();
        assert_eq!(saved, dir.path().join("cleaned_photo.jpg"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"clean");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn directory_sink_strips_path_components() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());
        let artifact = DownloadArtifact {
            filename: "../escape.bin".into(),
            bytes: vec![1, 2, 3],
        };
        let saved = sink.save(&artifact).unwrap();
        assert_eq!(saved, dir.path().join("escape.bin"));
    }

    #[test]
    fn directory_sink_never_replaces_existing_downloads() {
        let dir = TempDir::new().unwrap();
        let earlier = dir.path().join("cleaned_files.zip");
        std::fs::write(&earlier, b"previous download").unwrap();

        let sink = DirectorySink::new(dir.path());
        let artifact = DownloadArtifact {
            filename: "cleaned_files.zip".into(),
            bytes: b"new".to_vec(),
        };

        let first = sink.save(&artifact).unwrap();
        assert_eq!(first, dir.path().join("cleaned_files (1).zip"));
        let second = sink.save(&artifact).unwrap();
        assert_eq!(second, dir.path().join("cleaned_files (2).zip"));

        assert_eq!(std::fs::read(&earlier).unwrap(), b"previous download");
        assert_eq!(std::fs::read(&first).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn numbered_names() {
        assert_eq!(numbered(Path::new("a.zip"), 0), PathBuf::from("a.zip"));
        assert_eq!(numbered(Path::new("a.tar.gz"), 2), PathBuf::from("a.tar (2).gz"));
        assert_eq!(numbered(Path::new("README"), 1), PathBuf::from("README (1)"));
    }

    #[test]
    fn failed_save_cleans_up_transient_file() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());
        // Longer than any file system allows for one name component.
        let artifact = DownloadArtifact {
            filename: format!("{}.zip", "x".repeat(300)),
            bytes: vec![0; 16],
        };
        assert!(sink.save(&artifact).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
