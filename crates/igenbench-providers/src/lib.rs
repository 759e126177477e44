//! Image generation and image understanding providers for IGenBench.
//!
//! This crate provides:
//!
//! - A [`ProviderClient`] trait with one implementation per backend
//!   (Google Gemini, OpenRouter, Replicate, and an offline fake)
//! - A shared HTTP layer with status mapping, retry with jittered backoff,
//!   and an outbound network policy
//! - VCR record/replay of provider calls for deterministic tests
//!
//! # Quick Start
//!
//! ```no_run
//! use igenbench_providers::{build_client, ImageInput, ProviderConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = build_client("google", &ProviderConfig::from_env())?;
//! let image = client.generate_image("gemini-2.0-flash-exp", "A bar chart").await?;
//! let answer = client
//!     .understand_image("gemini-2.5-flash", &ImageInput::new(image.bytes), "Is it a bar chart?")
//!     .await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `GOOGLE_API_KEY` | Google AI Studio key (fallback: `GEMINI_API_KEY`) |
//! | `OPENROUTER_API_KEY` | OpenRouter key |
//! | `REPLICATE_API_TOKEN` | Replicate token |
//! | `IGENBENCH_GOOGLE_BASE_URL` | Override Gemini API base URL |
//! | `IGENBENCH_OPENROUTER_BASE_URL` | Override OpenRouter API base URL |
//! | `IGENBENCH_REPLICATE_BASE_URL` | Override Replicate API base URL |
//! | `IGENBENCH_HTTP_TIMEOUT` | Request timeout in seconds (default: 120) |
//! | `IGENBENCH_MAX_RETRIES` | Max retries for transient failures (default: 3) |
//! | `IGENBENCH_FAKE_ANSWER` | Answer returned by the `fake` provider (default: `1`) |
//! | `IGENBENCH_NETWORK_POLICY` | `deny` blocks all outbound provider calls |
//! | `IGENBENCH_VCR_MODE` | `off`, `record` or `replay` |
//! | `IGENBENCH_VCR_DIR` | Cassette directory (default: `tests/fixtures/cassettes`) |

pub mod client;
pub mod error;
pub mod fake;
pub mod google;
mod http;
pub mod image;
pub mod network;
pub mod openrouter;
pub mod replicate;
pub mod types;
pub mod vcr;

pub use client::{build_client, ProviderClient};
pub use error::{ProviderError, ProviderResult};
pub use fake::FakeClient;
pub use google::GoogleClient;
pub use http::USER_AGENT_VALUE;
pub use image::{GeneratedImage, ImageFormat, ImageInput, PLACEHOLDER_PNG};
pub use network::{check_outbound, NetworkPolicy, NetworkPolicyGuard};
pub use openrouter::OpenRouterClient;
pub use replicate::ReplicateClient;
pub use types::{ProviderConfig, ProviderKind};
pub use vcr::{VcrClient, VcrMode};
