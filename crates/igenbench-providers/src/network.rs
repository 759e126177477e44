//! Process-wide outbound network policy.
//!
//! `IGENBENCH_NETWORK_POLICY=deny` blocks every provider call, which keeps
//! offline runs (fake provider, VCR replay) honest.

use std::sync::{Mutex, OnceLock};

use crate::error::{ProviderError, ProviderResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkPolicy {
    Allow,
    Deny(String),
}

#[derive(Debug)]
struct NetworkState {
    policy: NetworkPolicy,
}

fn state() -> &'static Mutex<NetworkState> {
    static STATE: OnceLock<Mutex<NetworkState>> = OnceLock::new();
    STATE.get_or_init(|| {
        Mutex::new(NetworkState {
            policy: NetworkPolicy::Allow,
        })
    })
}

/// Scoped policy override; the previous policy is restored on drop.
pub struct NetworkPolicyGuard {
    previous: NetworkPolicy,
}

impl NetworkPolicyGuard {
    pub fn set(policy: NetworkPolicy) -> Self {
        let mut s = state().lock().unwrap_or_else(|e| e.into_inner());
        let previous = s.policy.clone();
        s.policy = policy;
        Self { previous }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::set(NetworkPolicy::Deny(reason.into()))
    }
}

impl Drop for NetworkPolicyGuard {
    fn drop(&mut self) {
        if let Ok(mut s) = state().lock() {
            s.policy = self.previous.clone();
        }
    }
}

pub fn check_outbound(target: &str) -> ProviderResult<()> {
    match effective_policy() {
        NetworkPolicy::Allow => Ok(()),
        NetworkPolicy::Deny(reason) => Err(ProviderError::Config {
            message: format!(
                "outbound network blocked by policy (target={}): {}",
                redact_query(target),
                reason
            ),
        }),
    }
}

fn effective_policy() -> NetworkPolicy {
    if let Ok(raw) = std::env::var("IGENBENCH_NETWORK_POLICY") {
        if raw.trim().eq_ignore_ascii_case("deny") {
            return NetworkPolicy::Deny("IGENBENCH_NETWORK_POLICY=deny".to_string());
        }
    }
    let s = state().lock().unwrap_or_else(|e| e.into_inner());
    s.policy.clone()
}

fn redact_query(target: &str) -> &str {
    target.split('?').next().unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn scoped_deny_blocks_and_restores() {
        std::env::remove_var("IGENBENCH_NETWORK_POLICY");
        let guard = NetworkPolicyGuard::deny("test deny");
        let err = check_outbound("https://example.test/v1?key=secret")
            .unwrap_err()
            .to_string();
        assert!(err.contains("outbound network blocked by policy"));
        assert!(err.contains("https://example.test/v1"));
        assert!(!err.contains("secret"));
        drop(guard);
        check_outbound("https://example.test/v1").unwrap();
    }

    #[test]
    #[serial]
    fn env_deny_overrides_scoped_allow() {
        let previous = std::env::var("IGENBENCH_NETWORK_POLICY").ok();
        let _guard = NetworkPolicyGuard::set(NetworkPolicy::Allow);
        std::env::set_var("IGENBENCH_NETWORK_POLICY", "deny");
        let err = check_outbound("env-target").unwrap_err().to_string();
        assert!(err.contains("IGENBENCH_NETWORK_POLICY=deny"));
        match previous {
            Some(v) => std::env::set_var("IGENBENCH_NETWORK_POLICY", v),
            None => std::env::remove_var("IGENBENCH_NETWORK_POLICY"),
        }
    }
}
