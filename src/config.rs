// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{REQUIRED_COMPONENTS, SUPPORTED_ARCH, SUPPORTED_LOG_LEVELS};
use crate::error::{BootstrapError, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Bootstrap configuration, built once at startup and passed by reference
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Toolkit version, `latest` or a release tag
    pub version: String,
    pub components: Vec<String>,
    /// Container registry where the toolkit images are published
    pub registry: String,
    /// Secret used for pulling images from a private registry, empty for none
    pub image_pull_secret: String,
    pub arch: String,
    /// Branch the Git source tracks
    pub branch: String,
    /// When false, controllers only watch their own namespace
    pub watch_all_namespaces: bool,
    /// Deny ingress to the controllers from other namespaces
    pub network_policy: bool,
    pub log_level: String,
    /// Local directory overriding the default component bases
    pub manifests_path: Option<PathBuf>,
    /// Upper bound for rollouts and readiness waits
    pub timeout: Duration,
}

impl BootstrapConfig {
    /// Check the configuration before anything touches the cluster
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_ARCH.contains(&self.arch.as_str()) {
            return Err(BootstrapError::UnsupportedArch {
                arch: self.arch.clone(),
                supported: &SUPPORTED_ARCH,
            });
        }

        if !SUPPORTED_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(BootstrapError::UnsupportedLogLevel {
                level: self.log_level.clone(),
                supported: &SUPPORTED_LOG_LEVELS,
            });
        }

        for component in REQUIRED_COMPONENTS {
            if !self.has_component(component) {
                return Err(BootstrapError::MissingComponent(component.to_string()));
            }
        }

        Ok(())
    }

    pub fn has_component(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }
}

/// Where the cluster should sync its desired state from
#[derive(Debug, Clone)]
pub struct SyncTarget {
    /// Repository URL, `ssh://git@host/org/repo` for deploy key access
    pub url: Url,
    /// Directory inside the repository holding this cluster's manifests
    pub path: String,
    /// Namespace the toolkit runs in; also the name of the sync objects and deploy key secret
    pub namespace: String,
    /// How often the Git source is polled
    pub interval: Duration,
}

impl SyncTarget {
    /// Sync objects are named after their namespace
    pub fn name(&self) -> &str {
        &self.namespace
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> BootstrapConfig {
    BootstrapConfig {
        version: "v0.1.0".to_string(),
        components: vec![
            "source-controller".to_string(),
            "kustomize-controller".to_string(),
            "notification-controller".to_string(),
        ],
        registry: "ghcr.io/fluxcd".to_string(),
        image_pull_secret: String::new(),
        arch: "amd64".to_string(),
        branch: "main".to_string(),
        watch_all_namespaces: true,
        network_policy: true,
        log_level: "info".to_string(),
        manifests_path: None,
        timeout: Duration::from_secs(300),
    }
}
