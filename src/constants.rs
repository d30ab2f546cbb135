// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Components that must be part of every bootstrap
pub const REQUIRED_COMPONENTS: [&str; 2] = ["source-controller", "kustomize-controller"];

/// Component whose presence enables event forwarding on the other controllers
pub const NOTIFICATION_CONTROLLER: &str = "notification-controller";

pub const SUPPORTED_ARCH: [&str; 2] = ["amd64", "arm64"];
pub const SUPPORTED_LOG_LEVELS: [&str; 3] = ["debug", "info", "error"];

/// The field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "gitops-bootstrap";

/// Files written into the namespaced manifests directory
pub mod files {
    pub const INSTALL_MANIFEST: &str = "toolkit-components.yaml";
    pub const SOURCE_MANIFEST: &str = "toolkit-source.yaml";
    pub const KUSTOMIZATION_MANIFEST: &str = "toolkit-kustomization.yaml";
    pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";
}

/// Keys of the deploy key secret consumed by the Git source object
pub mod secret_keys {
    pub const IDENTITY: &str = "identity";
    pub const IDENTITY_PUB: &str = "identity.pub";
    pub const KNOWN_HOSTS: &str = "known_hosts";
}

/// Default values for the command line surface
pub mod defaults {
    pub const VERSION: &str = "latest";
    pub const COMPONENTS: &str = "source-controller,kustomize-controller,notification-controller";
    pub const REGISTRY: &str = "ghcr.io/fluxcd";
    pub const ARCH: &str = "amd64";
    pub const BRANCH: &str = "main";
    pub const LOG_LEVEL: &str = "info";
    pub const NAMESPACE: &str = "flux-system";
    pub const INTERVAL: &str = "1m";
    pub const TIMEOUT: &str = "5m";
    /// Kustomize remote holding `bases/<component>` and `policies`
    pub const BASE_URL: &str = "github.com/fluxcd/toolkit//manifests";
}

/// Readiness polling configuration
pub mod poll {
    use super::Duration;

    /// Delay between two readiness checks
    pub const INTERVAL: Duration = Duration::from_secs(2);
}

/// Reconciliation interval of the generated Kustomization, independent of the source interval
pub const KUSTOMIZATION_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Timeout for scanning the Git host's SSH key
pub const HOST_KEY_SCAN_TIMEOUT_SECS: u64 = 30;
