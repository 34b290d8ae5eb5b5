// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image-generation backends and the factory that picks one.

mod gemini;
mod openai;

use std::sync::Arc;

use brieflow_config::{BrieflowConfig, Secrets};
use brieflow_core::{BrieflowError, ImageGenerator, ImageProviderKind};

pub use gemini::GeminiImageGenerator;
pub use openai::OpenAiImageGenerator;

/// Builds the generator for `kind`. Fails when that backend's API key is missing.
pub fn image_generator_for(
    kind: ImageProviderKind,
    config: &BrieflowConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn ImageGenerator>, BrieflowError> {
    let timeout = std::time::Duration::from_secs(config.images.timeout_secs);
    match kind {
        ImageProviderKind::Gemini => {
            let key = secrets.gemini_api_key.clone().ok_or_else(|| {
                BrieflowError::Config("images.provider = gemini requires GEMINI_API_KEY".into())
            })?;
            Ok(Arc::new(GeminiImageGenerator::new(
                &config.gemini,
                key,
                timeout,
            )?))
        }
        ImageProviderKind::Openai => {
            let key = secrets.openai_api_key.clone().ok_or_else(|| {
                BrieflowError::Config("images.provider = openai requires OPENAI_API_KEY".into())
            })?;
            Ok(Arc::new(OpenAiImageGenerator::new(
                &config.openai,
                key,
                timeout,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn factory_selects_backend_by_kind() {
        let config = BrieflowConfig::default();
        let secrets = Secrets {
            gemini_api_key: Some(SecretString::from("g")),
            openai_api_key: Some(SecretString::from("o")),
            ..Secrets::default()
        };
        let gemini = image_generator_for(ImageProviderKind::Gemini, &config, &secrets).unwrap();
        let openai = image_generator_for(ImageProviderKind::Openai, &config, &secrets).unwrap();
        assert_eq!(gemini.name(), "gemini");
        assert_eq!(openai.name(), "openai");
    }

    #[test]
    fn factory_requires_the_selected_key() {
        let config = BrieflowConfig::default();
        let secrets = Secrets {
            openai_api_key: Some(SecretString::from("o")),
            ..Secrets::default()
        };
        let err = image_generator_for(ImageProviderKind::Gemini, &config, &secrets)
            .err()
            .unwrap();
        assert!(matches!(err, BrieflowError::Config(_)));
    }
}
