// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every external dependency of the pipeline sits behind one of these traits
//! and uses `#[async_trait]` so it can be held as `Arc<dyn Trait>`.

pub mod capture;
pub mod catalog;
pub mod cdn;
pub mod email;
pub mod image;
pub mod model;
pub mod research;
pub mod storage;
pub mod webhook;

pub use capture::PageCapture;
pub use catalog::ReferenceCatalog;
pub use cdn::CdnUploader;
pub use email::EmailNotifier;
pub use image::ImageGenerator;
pub use model::{LanguageModel, StructuredRequest, TextRequest};
pub use research::ResearchProvider;
pub use storage::{ObjectStore, StatusStore};
pub use webhook::WebhookTransport;
