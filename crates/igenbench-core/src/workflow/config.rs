use std::path::PathBuf;
use std::sync::Arc;

use igenbench_providers::{build_client, ProviderClient, ProviderConfig, ProviderKind};

use crate::errors::RunError;

/// Settings shared by the generation and evaluation workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub provider: String,
    pub model: String,
    pub output_dir: PathBuf,
    pub resume: bool,
}

impl WorkflowConfig {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        resume: bool,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            output_dir: output_dir.into(),
            resume,
        }
    }

    pub fn validate(&self) -> Result<ProviderKind, RunError> {
        if self.provider.trim().is_empty() {
            return Err(RunError::invalid_input("Provider is required"));
        }
        if self.model.trim().is_empty() {
            return Err(RunError::invalid_input("Model is required"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(RunError::invalid_input("Output directory is required"));
        }
        self.provider.parse::<ProviderKind>().map_err(|_| {
            RunError::invalid_input(format!(
                "Invalid provider '{}': supported providers are {}",
                self.provider,
                ProviderKind::supported()
            ))
        })
    }

    /// Validate, then build the provider client.
    pub fn build_client(
        &self,
        provider_config: &ProviderConfig,
    ) -> anyhow::Result<Arc<dyn ProviderClient>> {
        let kind = self.validate()?;
        Ok(build_client(kind.as_str(), provider_config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RunErrorKind;

    #[test]
    fn validation() {
        let ok = WorkflowConfig::new("Google", "gemini-2.5-flash", "outputs/", false);
        assert_eq!(ok.validate().unwrap(), ProviderKind::Google);

        for bad in [
            WorkflowConfig::new("", "m", "out", false),
            WorkflowConfig::new("google", " ", "out", false),
            WorkflowConfig::new("google", "m", "", false),
        ] {
            assert_eq!(bad.validate().unwrap_err().kind, RunErrorKind::InvalidInput);
        }

        let unknown = WorkflowConfig::new("dalle", "m", "out", false)
            .validate()
            .unwrap_err();
        assert!(unknown.message.starts_with("Invalid provider 'dalle':"));
        assert!(unknown.message.contains("openrouter"));
    }

    #[test]
    fn build_client_reports_missing_key_as_invalid_input() {
        let cfg = WorkflowConfig::new("openrouter", "m", "out", false);
        let err = cfg.build_client(&ProviderConfig::default()).err().unwrap();
        let run = RunError::from_anyhow(&err);
        assert_eq!(run.kind, RunErrorKind::InvalidInput);
        assert!(run.message.contains("OPENROUTER_API_KEY"));

        let fake = WorkflowConfig::new("fake", "m", "out", false);
        assert!(fake.build_client(&ProviderConfig::default()).is_ok());
    }
}
