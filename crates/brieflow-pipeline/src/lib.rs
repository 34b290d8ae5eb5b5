// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job orchestration for Brieflow.
//!
//! A brief job turns a landing page into researched avatars, marketing
//! angles and an offer brief. An image job takes one avatar of a finished
//! brief and fills a grid of creative slots with generated images. Both run
//! through [`JobOrchestrator`] over an injected [`Services`] bundle.

pub mod assigner;
pub mod cache;
pub mod classifier;
pub mod executor;
pub mod fanout;
pub mod image_job;
pub mod normalize;
pub mod notifier;
pub mod orchestrator;
pub mod persister;
pub mod prompts;
pub mod services;
pub mod structured;
pub mod tracker;

pub use image_job::ImageJobOutcome;
pub use orchestrator::{JobOrchestrator, JobOutcome};
pub use services::{GeneratorFactory, Services};
