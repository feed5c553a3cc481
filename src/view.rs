use std::path::PathBuf;

use crate::config::TriggerLabels;
use crate::render::RenderedAnalysis;
use crate::staging::Mode;

/// Where a form is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Idle,
    FileStaged,
    Submitting,
    ResultReady,
    Error,
}

/// The button that starts a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerControl {
    enabled: bool,
    label: String,
    labels: TriggerLabels,
}

impl TriggerControl {
    pub fn new(labels: TriggerLabels, enabled: bool) -> Self {
        Self {
            enabled,
            label: labels.resting.clone(),
            labels,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_busy(&mut self) {
        self.enabled = false;
        self.label = self.labels.busy.clone();
    }

    pub fn rest(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.label = self.labels.resting.clone();
    }
}

/// Visual state of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Complete,
    Failed,
}

impl Status {
    /// Status line wording for a form in `mode`.
    pub fn text(&self, mode: Mode) -> &'static str {
        match (mode, self) {
            (Mode::Single, Status::Idle) => "No file analyzed",
            (Mode::Single, Status::Complete) => "Analysis complete",
            (Mode::Single, Status::Failed) => "Analysis failed",
            (Mode::Multi, Status::Idle) => "No files processed",
            (Mode::Multi, Status::Complete) => "Processing complete",
            (Mode::Multi, Status::Failed) => "Processing failed",
        }
    }
}

/// Contents of the result panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Empty,
    Analysis(RenderedAnalysis),
    Downloaded { filename: String, path: PathBuf },
    Error(String),
}

/// Everything a surface needs to draw one form's result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    panel: ResultPanel,
    status: Status,
}

impl Default for View {
    fn default() -> Self {
        Self {
            panel: ResultPanel::Empty,
            status: Status::Idle,
        }
    }
}

impl View {
    pub fn panel(&self) -> &ResultPanel {
        &self.panel
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.panel {
            ResultPanel::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Switch to the error state and show `message` verbatim.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.panel = ResultPanel::Error(message.into());
        self.status = Status::Failed;
    }

    /// Back to the empty view with no success or failure styling.
    pub fn reset_results(&mut self) {
        self.panel = ResultPanel::Empty;
        self.status = Status::Idle;
    }

    pub fn show_analysis(&mut self, rendered: RenderedAnalysis) {
        self.panel = ResultPanel::Analysis(rendered);
        self.status = Status::Complete;
    }

    pub fn show_download(&mut self, filename: String, path: PathBuf) {
        self.panel = ResultPanel::Downloaded { filename, path };
        self.status = Status::Complete;
    }
}
