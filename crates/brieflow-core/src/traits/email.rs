// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email notification trait.

use async_trait::async_trait;

use crate::error::BrieflowError;

#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), BrieflowError>;
}
