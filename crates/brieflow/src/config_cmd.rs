// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `brieflow config`: the effective configuration as TOML.

use brieflow_config::BrieflowConfig;
use brieflow_core::BrieflowError;

const REDACTED: &str = "<redacted>";

pub fn print_config(config: &BrieflowConfig) -> Result<(), BrieflowError> {
    let rendered = toml::to_string_pretty(&redacted(config))
        .map_err(|e| BrieflowError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// A copy with every configured secret replaced by a placeholder.
fn redacted(config: &BrieflowConfig) -> BrieflowConfig {
    let mut copy = config.clone();
    for secret in [
        &mut copy.anthropic.api_key,
        &mut copy.openai.api_key,
        &mut copy.gemini.api_key,
        &mut copy.cdn.api_token,
        &mut copy.webhook.secret,
        &mut copy.email.password,
    ] {
        if secret.is_some() {
            *secret = Some(REDACTED.to_string());
        }
    }
    copy
}
