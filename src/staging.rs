use std::path::PathBuf;
use walkdir::WalkDir;

use crate::error::TransportError;

/// Selection discipline of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Analysis: at most one file, a new pick replaces the old one.
    Single,
    /// Removal: an ordered list of files, sent in order.
    Multi,
}

/// A user-chosen file.
///
/// Only the name is known up front. The contents stay on disk until
/// [`StagedFile::read_content`] is called while the request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    path: PathBuf,
    name: String,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn read_content(&self) -> Result<Vec<u8>, TransportError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| TransportError::ReadFile {
                name: self.name.clone(),
                source,
            })
    }
}

/// Backing list of the native file picker.
///
/// The list cannot be edited in place: every change goes through
/// [`FilePicker::set_files`] with a freshly built collection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilePicker {
    files: Vec<StagedFile>,
}

impl FilePicker {
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn set_files(&mut self, files: Vec<StagedFile>) {
        self.files = files;
    }

    pub fn reset(&mut self) {
        self.files = Vec::new();
    }
}

/// Drag events arriving at the drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Enter,
    Over,
    Leave,
    Drop,
}

/// Highlight state of the drop zone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropZone {
    highlighted: bool,
}

impl DropZone {
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Apply a drag event. Always returns `true`: the default "open file"
    /// navigation is suppressed for every phase.
    pub fn on_drag(&mut self, phase: DragPhase) -> bool {
        self.highlighted = matches!(phase, DragPhase::Enter | DragPhase::Over);
        true
    }
}

/// Owns the current selection and keeps the picker in step with it.
#[derive(Debug, Clone)]
pub struct StagingManager {
    mode: Mode,
    files: Vec<StagedFile>,
    picker: FilePicker,
}

impl StagingManager {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            files: Vec::new(),
            picker: FilePicker::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn picker(&self) -> &FilePicker {
        &self.picker
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Names in display order; this is the visible file list (or the single
    /// file label in analysis mode).
    pub fn display_names(&self) -> Vec<&str> {
        self.files.iter().map(StagedFile::name).collect()
    }

    /// Replace the selection with one file.
    pub fn stage(&mut self, file: StagedFile) {
        log::debug!("Staged {}", file.name());
        self.files = vec![file];
        self.picker.set_files(self.files.clone());
    }

    /// Replace the selection with a fresh pick or drop.
    ///
    /// In single mode only the first file is kept and an empty pick leaves
    /// the current selection alone. Returns whether the selection changed.
    pub fn stage_many(&mut self, files: Vec<StagedFile>) -> bool {
        match self.mode {
            Mode::Single => match files.into_iter().next() {
                Some(first) => {
                    self.stage(first);
                    true
                }
                None => false,
            },
            Mode::Multi => {
                log::debug!("Staged {} file(s)", files.len());
                self.files = files;
                self.picker.set_files(self.files.clone());
                true
            }
        }
    }

    /// Remove the file at `index` (multi mode only) and rebuild the picker
    /// from the remaining files.
    pub fn unstage(&mut self, index: usize) -> Option<StagedFile> {
        if self.mode != Mode::Multi || index >= self.files.len() {
            log::debug!("Ignoring unstage of index {index}");
            return None;
        }
        let removed = self.files.remove(index);
        let rebuilt: Vec<StagedFile> = self.files.iter().cloned().collect();
        self.picker.set_files(rebuilt);
        log::debug!("Unstaged {}", removed.name());
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.picker.reset();
    }
}

/// Collect files from the given paths, walking directories recursively.
///
/// Paths that do not exist are skipped with a warning. Order follows the
/// arguments, then directory walk order (sorted by file name).
pub fn collect_files(paths: &[PathBuf]) -> Vec<StagedFile> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(StagedFile::new(path.clone()));
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.path().is_file() {
                    files.push(StagedFile::new(entry.path().to_path_buf()));
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn files(names: &[&str]) -> Vec<StagedFile> {
        names.iter().map(|n| StagedFile::new(*n)).collect()
    }

    #[test]
    fn staged_file_name_from_path() {
        let f = StagedFile::new("/tmp/photos/photo.jpg");
        assert_eq!(f.name(), "photo.jpg");
    }

    #[test]
    fn single_mode_replaces_selection() {
        let mut staging = StagingManager::new(Mode::Single);
        staging.stage(StagedFile::new("a.jpg"));
        staging.stage(StagedFile::new("b.jpg"));
        assert_eq!(staging.display_names(), vec!["b.jpg"]);
        assert_eq!(staging.picker().files(), staging.files());
    }

    #[test]
    fn single_mode_keeps_first_of_many() {
        let mut staging = StagingManager::new(Mode::Single);
        assert!(staging.stage_many(files(&["a.jpg", "b.jpg"])));
        assert_eq!(staging.display_names(), vec!["a.jpg"]);
    }

    #[test]
    fn single_mode_ignores_empty_pick() {
        let mut staging = StagingManager::new(Mode::Single);
        staging.stage(StagedFile::new("a.jpg"));
        assert!(!staging.stage_many(Vec::new()));
        assert_eq!(staging.display_names(), vec!["a.jpg"]);
    }

    #[test]
    fn multi_mode_replaces_rather_than_appends() {
        let mut staging = StagingManager::new(Mode::Multi);
        staging.stage_many(files(&["a.jpg", "b.jpg"]));
        staging.stage_many(files(&["c.pdf"]));
        assert_eq!(staging.display_names(), vec!["c.pdf"]);
    }

    #[test]
    fn unstage_preserves_order_and_rebuilds_picker() {
        let mut staging = StagingManager::new(Mode::Multi);
        staging.stage_many(files(&["a", "b", "c", "d"]));

        let removed = staging.unstage(1).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(staging.display_names(), vec!["a", "c", "d"]);
        assert_eq!(staging.picker().files(), staging.files());

        staging.unstage(2);
        assert_eq!(staging.display_names(), vec!["a", "c"]);
        assert_eq!(staging.picker().files(), staging.files());
    }

    #[test]
    fn unstage_sequence_matches_model() {
        // Remove from a model vector and the manager in lockstep.
        let names = ["0", "1", "2", "3", "4", "5", "6"];
        let mut model: Vec<&str> = names.to_vec();
        let mut staging = StagingManager::new(Mode::Multi);
        staging.stage_many(files(&names));

        for idx in [3, 0, 4, 1, 0] {
            model.remove(idx);
            staging.unstage(idx);
            assert_eq!(staging.display_names(), model);
            let picker_names: Vec<&str> =
                staging.picker().files().iter().map(StagedFile::name).collect();
            assert_eq!(picker_names, model);
        }
    }

    #[test]
    fn unstage_out_of_range_is_noop() {
        let mut staging = StagingManager::new(Mode::Multi);
        staging.stage_many(files(&["a"]));
        assert!(staging.unstage(5).is_none());
        assert_eq!(staging.len(), 1);
    }

    #[test]
    fn unstage_not_available_in_single_mode() {
        let mut staging = StagingManager::new(Mode::Single);
        staging.stage(StagedFile::new("a"));
        assert!(staging.unstage(0).is_none());
        assert_eq!(staging.len(), 1);
    }

    #[test]
    fn clear_resets_picker() {
        let mut staging = StagingManager::new(Mode::Multi);
        staging.stage_many(files(&["a", "b"]));
        staging.clear();
        assert!(staging.is_empty());
        assert!(staging.picker().files().is_empty());
    }

    #[test]
    fn drop_zone_highlight() {
        let mut zone = DropZone::default();
        assert!(zone.on_drag(DragPhase::Enter));
        assert!(zone.is_highlighted());
        assert!(zone.on_drag(DragPhase::Over));
        assert!(zone.is_highlighted());
        assert!(zone.on_drag(DragPhase::Leave));
        assert!(!zone.is_highlighted());
        zone.on_drag(DragPhase::Over);
        assert!(zone.on_drag(DragPhase::Drop));
        assert!(!zone.is_highlighted());
    }

    #[tokio::test]
    async fn read_content_is_lazy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.txt");
        let file = StagedFile::new(path.clone());

        // Staging does not touch the file; it only has to exist at send time.
        fs::write(&path, b"hello").unwrap();
        assert_eq!(file.read_content().await.unwrap(), b"hello");

        fs::remove_file(&path).unwrap();
        assert!(file.read_content().await.is_err());
    }

    #[test]
    fn collect_files_walks_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.png"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.pdf"), b"").unwrap();
        let single = dir.path().join("a.jpg");
        fs::write(&single, b"").unwrap();

        let found = collect_files(&[single, dir.path().join("sub"), dir.path().join("missing")]);
        let names: Vec<&str> = found.iter().map(StagedFile::name).collect();
        assert_eq!(names, vec!["a.jpg", "c.pdf"]);
    }
}
