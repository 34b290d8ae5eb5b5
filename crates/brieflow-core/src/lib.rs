// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Brieflow content-generation pipeline.
//!
//! This crate provides the error type, the domain types that flow between
//! pipeline stages, and the collaborator traits every adapter implements.

pub mod brief;
pub mod creative;
pub mod error;
pub mod job;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BrieflowError;
pub use job::{ImageJobConfig, JobConfig, Targeting};
pub use types::{ImageInput, ImageProviderKind, JobId, JobStatus, StatusRecord};

pub use traits::{
    CdnUploader, EmailNotifier, ImageGenerator, LanguageModel, ObjectStore, PageCapture,
    ReferenceCatalog, ResearchProvider, StatusStore, WebhookTransport,
};
