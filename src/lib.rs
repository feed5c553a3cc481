//! # metaclean
//!
//! Client for a file metadata service: inspect the embedded metadata of one
//! file, or strip metadata from several files and save the sanitized result.
//!
//! The service does the actual extraction and removal. This crate owns the
//! client side: which files are staged, how they are sent, and how each kind
//! of response is shown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metaclean::config::Config;
//! use metaclean::form::Form;
//! use metaclean::render::DirectorySink;
//! use metaclean::staging::{Mode, StagedFile};
//! use metaclean::transport::HttpTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let transport = HttpTransport::new(&config.server.base_url, config.server.timeout())?;
//!     let sink = DirectorySink::new(&config.output.download_dir);
//!
//!     let mut form = Form::new(Mode::Single, config.labels.analyze.clone());
//!     form.stage(StagedFile::new("photo.jpg"));
//!
//!     match form.submit(&transport, &sink).await {
//!         Ok(outcome) => println!("{outcome:?}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoints
//!
//! | Endpoint | Request | Success body |
//! |----------|---------|--------------|
//! | `POST /api/analyze` | one `file` part | JSON `{filename, mimetype, metadata}` |
//! | `POST /api/remove` | one `file` part per file | sanitized file, or a zip for several |
//!
//! ## Modules
//!
//! - [`staging`]: Selection state, file picker and drop zone
//! - [`form`]: Form controller and submission
//! - [`events`]: Input event dispatch table
//! - [`transport`]: Multipart transport trait and HTTP implementation
//! - [`metadata`]: Analysis response and metadata tree types
//! - [`render`]: Metadata tree rendering and download saving
//! - [`view`]: Result panel, status line and trigger control
//! - [`config`]: Configuration types and loading/saving
//! - [`error`]: Submission and transport errors

pub mod config;
pub mod error;
pub mod events;
pub mod form;
pub mod metadata;
pub mod render;
pub mod staging;
pub mod transport;
pub mod view;
