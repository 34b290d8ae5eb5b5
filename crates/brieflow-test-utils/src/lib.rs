// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Brieflow integration tests.
//!
//! Provides in-memory and scripted implementations of every collaborator
//! trait, plus a [`TestHarness`] that wires them into a job orchestrator
//! backed by a temporary SQLite database.
//!
//! # Components
//!
//! - [`MockLanguageModel`] - structured and text answers scripted per schema name
//! - [`RecordingWebhookTransport`] - captures every webhook POST
//! - [`InMemoryObjectStore`] / [`InMemoryStatusStore`] - inspectable storage
//! - [`RecordingStatusStore`] - status history over a real store
//! - [`TestHarness`] - full orchestrator over the mocks

pub mod harness;
pub mod mock_media;
pub mod mock_model;
pub mod mock_storage;

pub use harness::{
    TEST_CALLBACK_URL, TEST_RESEARCH_DOCUMENT, TEST_WEBHOOK_SECRET, TestHarness, TestHarnessBuilder,
    script_default_answers,
};
pub use mock_media::{
    MockCdn, MockEmail, MockImageGenerator, MockPageCapture, MockResearch, RecordingWebhookTransport,
    StaticCatalog, WebhookCall,
};
pub use mock_model::MockLanguageModel;
pub use mock_storage::{InMemoryObjectStore, InMemoryStatusStore, RecordingStatusStore};
