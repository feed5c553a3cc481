//! Discrete input events and how each one moves a [`Form`].

use crate::form::Form;
use crate::staging::{DragPhase, Mode, StagedFile};

/// Everything a surface can report to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The native picker's value changed.
    PickerChanged(Vec<StagedFile>),
    /// The drop zone was clicked; the surface should open the picker.
    DropZoneClicked,
    DragEnter,
    DragOver,
    DragLeave,
    /// Files were dropped (possibly none).
    Drop(Vec<StagedFile>),
    /// The remove button next to a listed file. In single mode this clears
    /// the one staged file.
    RemoveFile(usize),
    ClearSelection,
    Submit,
}

/// Follow-up work the surface must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    OpenPicker,
    /// Run [`Form::submit`].
    Submit,
}

/// Result of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// The surface must suppress its default handling (file navigation on drops).
    pub default_prevented: bool,
    pub command: Option<Command>,
}

impl Dispatch {
    fn prevented() -> Self {
        Self {
            default_prevented: true,
            command: None,
        }
    }

    fn command(command: Command) -> Self {
        Self {
            default_prevented: false,
            command: Some(command),
        }
    }
}

impl Form {
    /// Apply `event` to the form.
    ///
    /// Submissions are asynchronous, so `Submit` only comes back as a
    /// [`Command`] for the caller to run.
    pub fn dispatch(&mut self, event: InputEvent) -> Dispatch {
        match event {
            InputEvent::PickerChanged(files) => {
                self.stage_many(files);
                Dispatch::default()
            }
            InputEvent::DropZoneClicked => Dispatch::command(Command::OpenPicker),
            InputEvent::DragEnter => self.drag(DragPhase::Enter),
            InputEvent::DragOver => self.drag(DragPhase::Over),
            InputEvent::DragLeave => self.drag(DragPhase::Leave),
            InputEvent::Drop(files) => {
                let dispatch = self.drag(DragPhase::Drop);
                self.stage_many(files);
                dispatch
            }
            InputEvent::RemoveFile(index) => {
                match self.mode() {
                    Mode::Single => self.clear(),
                    Mode::Multi => {
                        self.unstage(index);
                    }
                }
                Dispatch::default()
            }
            InputEvent::ClearSelection => {
                self.clear();
                Dispatch::default()
            }
            InputEvent::Submit => Dispatch::command(Command::Submit),
        }
    }

    fn drag(&mut self, phase: DragPhase) -> Dispatch {
        if self.drop_zone_mut().on_drag(phase) {
            Dispatch::prevented()
        } else {
            Dispatch::default()
        }
    }
}
