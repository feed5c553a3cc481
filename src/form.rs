//! The form controller: one selection, one trigger control, one result view.
//!
//! A [`Form`] owns all mutable state of either the analysis form
//! ([`Mode::Single`]) or the removal form ([`Mode::Multi`]). Every mutation
//! updates the selection, the trigger control and the view together before
//! returning, so a surface never observes a half-applied change.

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::TriggerLabels;
use crate::error::SubmitError;
use crate::metadata::AnalysisResult;
use crate::render::{DownloadArtifact, DownloadSink, render_analysis};
use crate::staging::{DropZone, Mode, StagedFile, StagingManager};
use crate::transport::{Endpoint, HttpResponse, MultipartBody, Transport};
use crate::view::{TriggerControl, UiState, View};

const NO_FILE_SINGLE: &str = "Please select a file first.";
const NO_FILE_MULTI: &str = "Please select at least one file.";
const GENERIC_FAILURE: &str = "An error occurred while processing your files. Please try again.";

/// Name of the archive returned when more than one file was sent.
pub const ARCHIVE_NAME: &str = "cleaned_files.zip";

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Analyzed(AnalysisResult),
    Downloaded { filename: String, path: PathBuf },
}

pub struct Form {
    staging: StagingManager,
    view: View,
    trigger: TriggerControl,
    drop_zone: DropZone,
    state: UiState,
}

impl Form {
    pub fn new(mode: Mode, labels: TriggerLabels) -> Self {
        Self {
            staging: StagingManager::new(mode),
            view: View::default(),
            trigger: TriggerControl::new(labels, mode == Mode::Multi),
            drop_zone: DropZone::default(),
            state: UiState::Idle,
        }
    }

    pub fn mode(&self) -> Mode {
        self.staging.mode()
    }

    pub fn staging(&self) -> &StagingManager {
        &self.staging
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn trigger(&self) -> &TriggerControl {
        &self.trigger
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub(crate) fn drop_zone_mut(&mut self) -> &mut DropZone {
        &mut self.drop_zone
    }

    pub fn drop_zone(&self) -> &DropZone {
        &self.drop_zone
    }

    /// Analysis forms need a file; removal forms validate at submit time.
    fn trigger_enabled_at_rest(&self) -> bool {
        match self.mode() {
            Mode::Single => !self.staging.is_empty(),
            Mode::Multi => true,
        }
    }

    fn after_staging(&mut self) {
        self.view.reset_results();
        self.state = if self.staging.is_empty() {
            UiState::Idle
        } else {
            UiState::FileStaged
        };
        let enabled = self.trigger_enabled_at_rest();
        self.trigger.set_enabled(enabled);
    }

    pub fn stage(&mut self, file: StagedFile) {
        self.staging.stage(file);
        self.after_staging();
    }

    pub fn stage_many(&mut self, files: Vec<StagedFile>) {
        if self.staging.stage_many(files) {
            self.after_staging();
        }
    }

    pub fn unstage(&mut self, index: usize) -> Option<StagedFile> {
        let removed = self.staging.unstage(index)?;
        self.after_staging();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.staging.clear();
        self.view.reset_results();
        self.state = UiState::Idle;
        let enabled = self.trigger_enabled_at_rest();
        self.trigger.set_enabled(enabled);
    }

    /// Send the current selection and present whatever comes back.
    ///
    /// Any failure is shown through the view exactly once and also
    /// returned. The trigger control is back at rest when this returns, and
    /// also if the future is dropped mid-request.
    pub async fn submit(
        &mut self,
        transport: &dyn Transport,
        sink: &dyn DownloadSink,
    ) -> Result<Outcome, SubmitError> {
        self.view.reset_results();
        let mode = self.mode();

        if self.staging.is_empty() {
            let msg = match mode {
                Mode::Single => NO_FILE_SINGLE,
                Mode::Multi => NO_FILE_MULTI,
            };
            let err = SubmitError::NoFileSelected(msg.to_string());
            self.view.show_error(err.to_string());
            self.state = UiState::Error;
            return Err(err);
        }

        let files = self.staging.files().to_vec();

        let exchanged = {
            let _busy = BusyGuard::engage(&mut self.trigger, &mut self.state);
            exchange(mode, &files, transport).await
        };

        let result = match exchanged {
            Ok(Delivery::Analysis(analysis)) => {
                self.view.show_analysis(render_analysis(&analysis));
                Ok(Outcome::Analyzed(analysis))
            }
            Ok(Delivery::Artifact(artifact)) => match sink.save(&artifact) {
                Ok(path) => {
                    self.view.show_download(artifact.filename.clone(), path.clone());
                    // A finished removal starts the next one from scratch.
                    self.staging.clear();
                    Ok(Outcome::Downloaded {
                        filename: artifact.filename,
                        path,
                    })
                }
                Err(e) => Err(transport_failure(mode, &format!("{e:#}"))),
            },
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => self.state = UiState::ResultReady,
            Err(e) => {
                self.view.show_error(e.to_string());
                self.state = UiState::Error;
            }
        }
        let enabled = self.trigger_enabled_at_rest();
        self.trigger.rest(enabled);

        result
    }
}

/// Holds the form in `Submitting` with a busy, disabled trigger until dropped.
struct BusyGuard<'a> {
    trigger: &'a mut TriggerControl,
    state: &'a mut UiState,
}

impl<'a> BusyGuard<'a> {
    fn engage(trigger: &'a mut TriggerControl, state: &'a mut UiState) -> Self {
        trigger.set_busy();
        *state = UiState::Submitting;
        Self { trigger, state }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        // A submission only starts with files staged, so both modes rest enabled.
        self.trigger.rest(true);
        *self.state = UiState::FileStaged;
    }
}

enum Delivery {
    Analysis(AnalysisResult),
    Artifact(DownloadArtifact),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

async fn exchange(
    mode: Mode,
    files: &[StagedFile],
    transport: &dyn Transport,
) -> Result<Delivery, SubmitError> {
    let endpoint = Endpoint::for_mode(mode);
    let body = MultipartBody::from_files(files);

    let resp = transport
        .post_multipart(endpoint, body)
        .await
        .map_err(|e| transport_failure(mode, &e))?;

    if !resp.is_success() {
        let err = rejection(endpoint, &resp);
        log::warn!("{} rejected with {}: {err}", endpoint.path(), resp.status);
        return Err(err);
    }

    match mode {
        Mode::Single => serde_json::from_slice::<AnalysisResult>(&resp.body)
            .map(Delivery::Analysis)
            .map_err(|e| transport_failure(mode, &e)),
        Mode::Multi => {
            let filename = download_filename(files);
            warn_on_type_mismatch(files.len(), &filename, resp.content_type.as_deref());
            Ok(Delivery::Artifact(DownloadArtifact {
                filename,
                bytes: resp.body,
            }))
        }
    }
}

/// Error text for a non-2xx response.
///
/// The analysis endpoint may send `{"message": ...}`; the removal endpoint's
/// error bodies are never parsed.
fn rejection(endpoint: Endpoint, resp: &HttpResponse) -> SubmitError {
    let message = match endpoint {
        Endpoint::Analyze => serde_json::from_slice::<ErrorBody>(&resp.body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Server returned {}", resp.status)),
        Endpoint::Remove => format!("Server error: {}", resp.status),
    };
    SubmitError::ServerRejected {
        status: resp.status,
        message,
    }
}

fn transport_failure(mode: Mode, cause: &dyn std::fmt::Display) -> SubmitError {
    log::error!("Submission failed: {cause}");
    let message = match mode {
        Mode::Single => cause.to_string(),
        Mode::Multi => GENERIC_FAILURE.to_string(),
    };
    SubmitError::TransportFailure(message)
}

/// Save name for a removal result, decided by how many files were sent.
pub fn download_filename(files: &[StagedFile]) -> String {
    match files {
        [only] => format!("cleaned_{}", only.name()),
        _ => ARCHIVE_NAME.to_string(),
    }
}

/// A zip declared for one file, or anything else declared for several.
/// A missing content type never disagrees.
fn declared_type_disagrees(count: usize, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("zip") != (count > 1))
}

fn warn_on_type_mismatch(count: usize, filename: &str, content_type: Option<&str>) {
    match content_type {
        Some(ct) if declared_type_disagrees(count, Some(ct)) => {
            log::warn!("Saving as {filename} but the service declared {ct}");
        }
        _ => {}
    }
}
