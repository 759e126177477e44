pub mod category;

pub use category::{error_summary, message_with_context, retry_guidance, ErrorCategory};

use std::fmt::{Display, Formatter};

use igenbench_providers::ProviderError;

use crate::vis_item::VisItemError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunErrorKind {
    NotFound,
    InvalidInput,
    ProviderRateLimit,
    ProviderTimeout,
    ProviderServer,
    Network,
    Auth,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    pub kind: RunErrorKind,
    pub message: String,
    pub path: Option<String>,
    pub status: Option<u16>,
    pub provider: Option<String>,
    pub detail: Option<String>,
    /// True when kind was inferred from free-form message parsing.
    pub legacy_classified: bool,
}

impl RunError {
    pub fn new(kind: RunErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            status: None,
            provider: None,
            detail: None,
            legacy_classified: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with_optional_provider(self, provider: Option<String>) -> Self {
        match provider {
            Some(p) => self.with_provider(p),
            None => self,
        }
    }

    pub fn not_found(path: impl Into<String>, detail: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(RunErrorKind::NotFound, format!("File not found: {}", path))
            .with_path(path)
            .with_detail(detail)
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::InvalidInput, detail.clone()).with_detail(detail)
    }

    pub fn provider_rate_limit(provider: Option<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::ProviderRateLimit, detail.clone())
            .with_status(429)
            .with_detail(detail)
            .with_optional_provider(provider)
    }

    pub fn provider_timeout(provider: Option<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::ProviderTimeout, detail.clone())
            .with_detail(detail)
            .with_optional_provider(provider)
    }

    pub fn provider_server(
        status: Option<u16>,
        provider: Option<String>,
        detail: impl Into<String>,
    ) -> Self {
        let detail = detail.into();
        let mut err = Self::new(RunErrorKind::ProviderServer, detail.clone())
            .with_detail(detail)
            .with_optional_provider(provider);
        if let Some(status) = status {
            err = err.with_status(status);
        }
        err
    }

    pub fn network(provider: Option<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::Network, detail.clone())
            .with_detail(detail)
            .with_optional_provider(provider)
    }

    pub fn auth(provider: Option<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::Auth, detail.clone())
            .with_detail(detail)
            .with_optional_provider(provider)
    }

    pub fn other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::Other, detail.clone()).with_detail(detail)
    }

    pub fn classify_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let msg = message.to_lowercase();

        let kind = if msg.contains("no such file")
            || msg.contains("file not found")
            || msg.contains("os error 2")
            || msg.contains("does not exist")
        {
            RunErrorKind::NotFound
        } else if msg.contains("invalid")
            || msg.contains("malformed")
            || msg.contains("missing field")
            || msg.contains("missing required")
            || msg.contains("no questions found")
            || msg.contains("is required")
        {
            RunErrorKind::InvalidInput
        } else if msg.contains("rate limit") || msg.contains("429") {
            RunErrorKind::ProviderRateLimit
        } else if msg.contains("timeout") || msg.contains("timed out") {
            RunErrorKind::ProviderTimeout
        } else if msg.contains("500")
            || msg.contains("502")
            || msg.contains("503")
            || msg.contains("504")
            || msg.contains("provider error")
        {
            RunErrorKind::ProviderServer
        } else if msg.contains("unauthorized") || msg.contains("401") || msg.contains("403") {
            RunErrorKind::Auth
        } else if msg.contains("network") || msg.contains("connection") || msg.contains("dns") {
            RunErrorKind::Network
        } else {
            RunErrorKind::Other
        };

        let mut run_error = Self::new(kind, message);
        run_error.legacy_classified = true;
        run_error
    }

    pub fn from_provider_error(err: &ProviderError) -> Self {
        let provider = err.provider().map(str::to_string);
        let detail = err.to_string();
        match err {
            ProviderError::MissingApiKey { .. }
            | ProviderError::UnsupportedProvider { .. }
            | ProviderError::BadRequest { .. } => {
                Self::invalid_input(detail).with_optional_provider(provider)
            }
            ProviderError::Unauthorized { .. } => Self::auth(provider, detail).with_status(401),
            ProviderError::RateLimited { .. } => Self::provider_rate_limit(provider, detail),
            ProviderError::Server { status, .. } => {
                Self::provider_server(Some(*status), provider, detail)
            }
            ProviderError::Timeout { .. } => Self::provider_timeout(provider, detail),
            ProviderError::Network { .. } => Self::network(provider, detail),
            ProviderError::NotFound { .. }
            | ProviderError::InvalidResponse { .. }
            | ProviderError::PredictionFailed { .. }
            | ProviderError::Config { .. } => {
                let mut e = Self::other(detail).with_optional_provider(provider);
                if let Some(status) = err.status() {
                    e = e.with_status(status);
                }
                e
            }
        }
    }

    pub fn from_vis_item_error(err: &VisItemError) -> Self {
        match err {
            VisItemError::NotFound { path } => {
                Self::not_found(path.display().to_string(), err.to_string())
            }
            e if e.is_invalid_input() => Self::invalid_input(e.to_string()),
            e => Self::other(e.to_string()),
        }
    }

    /// Walk the error chain for a typed cause before falling back to message parsing.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(run) = cause.downcast_ref::<RunError>() {
                return run.clone();
            }
            if let Some(e) = cause.downcast_ref::<VisItemError>() {
                return Self::from_vis_item_error(e);
            }
            if let Some(e) = cause.downcast_ref::<ProviderError>() {
                return Self::from_provider_error(e);
            }
            if let Some(e) = cause.downcast_ref::<std::io::Error>() {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Self::new(RunErrorKind::NotFound, format!("{:#}", err))
                        .with_detail(e.to_string());
                }
            }
        }
        Self::classify_message(format!("{:#}", err))
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::{RunError, RunErrorKind};
    use crate::vis_item::VisItemError;
    use anyhow::Context;
    use igenbench_providers::ProviderError;

    #[test]
    fn classify_message_maps_input_errors() {
        assert_eq!(
            RunError::classify_message("No such file or directory (os error 2)").kind,
            RunErrorKind::NotFound
        );
        assert_eq!(
            RunError::classify_message("No questions found for item 7").kind,
            RunErrorKind::InvalidInput
        );
        assert_eq!(
            RunError::classify_message("Generation requires t2i_prompt: field is required").kind,
            RunErrorKind::InvalidInput
        );
    }

    #[test]
    fn classify_message_maps_infra_errors() {
        assert_eq!(
            RunError::classify_message("provider returned 429").kind,
            RunErrorKind::ProviderRateLimit
        );
        assert_eq!(
            RunError::classify_message("request timeout while calling provider").kind,
            RunErrorKind::ProviderTimeout
        );
        assert_eq!(
            RunError::classify_message("provider error: 503").kind,
            RunErrorKind::ProviderServer
        );
        assert_eq!(
            RunError::classify_message("network dns resolution failed").kind,
            RunErrorKind::Network
        );
        assert_eq!(
            RunError::classify_message("something odd").kind,
            RunErrorKind::Other
        );
    }

    #[test]
    fn typed_constructors_capture_stable_fields() {
        let missing = RunError::not_found("items/1.json", "os error 2");
        assert_eq!(missing.kind, RunErrorKind::NotFound);
        assert_eq!(missing.path.as_deref(), Some("items/1.json"));
        assert_eq!(missing.to_string(), "File not found: items/1.json");
        assert!(!missing.legacy_classified);

        let server =
            RunError::provider_server(Some(503), Some("google".to_string()), "overloaded");
        assert_eq!(server.kind, RunErrorKind::ProviderServer);
        assert_eq!(server.status, Some(503));
        assert_eq!(server.provider.as_deref(), Some("google"));
    }

    #[test]
    fn from_anyhow_prefers_typed_causes() {
        let err = anyhow::Error::new(ProviderError::MissingApiKey {
            env_var: "GOOGLE_API_KEY".into(),
        })
        .context("failed to build provider client");
        let run = RunError::from_anyhow(&err);
        assert_eq!(run.kind, RunErrorKind::InvalidInput);
        assert!(run.message.contains("GOOGLE_API_KEY"));
        assert!(!run.legacy_classified);

        let err = anyhow::Error::new(VisItemError::NotFound {
            path: "x.json".into(),
        });
        assert_eq!(RunError::from_anyhow(&err).kind, RunErrorKind::NotFound);

        let io: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = io.context("reading image out/1/1_m.png").unwrap_err();
        let run = RunError::from_anyhow(&err);
        assert_eq!(run.kind, RunErrorKind::NotFound);

        let err = anyhow::Error::new(RunError::invalid_input("bad")).context("outer");
        assert_eq!(RunError::from_anyhow(&err).kind, RunErrorKind::InvalidInput);
    }

    #[test]
    fn provider_errors_map_to_kinds() {
        let cases = [
            (
                ProviderError::RateLimited {
                    provider: "openrouter".into(),
                    retry_after: None,
                },
                RunErrorKind::ProviderRateLimit,
            ),
            (
                ProviderError::Unauthorized {
                    provider: "google".into(),
                    message: "bad key".into(),
                },
                RunErrorKind::Auth,
            ),
            (
                ProviderError::Timeout {
                    message: "poll".into(),
                },
                RunErrorKind::ProviderTimeout,
            ),
            (
                ProviderError::InvalidResponse {
                    provider: "google".into(),
                    message: "no image".into(),
                },
                RunErrorKind::Other,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(RunError::from_provider_error(&err).kind, kind);
        }
    }
}
