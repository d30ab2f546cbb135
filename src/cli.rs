// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line surface

use crate::config::{BootstrapConfig, SyncTarget};
use crate::constants::defaults;
use crate::types::parse_duration;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Bootstrap the GitOps toolkit onto a cluster and point it at a Git repository
#[derive(Parser, Debug, Clone)]
#[command(name = "gitops-bootstrap", about, long_about = None)]
pub struct Cli {
    /// Toolkit version
    #[arg(short = 'v', long = "version", env = "BOOTSTRAP_VERSION", default_value = defaults::VERSION)]
    pub toolkit_version: String,

    /// Toolkit components to install
    #[arg(
        long,
        env = "BOOTSTRAP_COMPONENTS",
        value_delimiter = ',',
        default_value = defaults::COMPONENTS
    )]
    pub components: Vec<String>,

    /// Container registry where the toolkit images are published
    #[arg(long, env = "BOOTSTRAP_REGISTRY", default_value = defaults::REGISTRY)]
    pub registry: String,

    /// Kubernetes secret name used for pulling the toolkit images from a private registry
    #[arg(long, env = "BOOTSTRAP_IMAGE_PULL_SECRET", default_value = "")]
    pub image_pull_secret: String,

    /// Architecture of the controller images, can be amd64 or arm64
    #[arg(long, env = "BOOTSTRAP_ARCH", default_value = defaults::ARCH)]
    pub arch: String,

    /// Default branch of the Git repository
    #[arg(long, env = "BOOTSTRAP_BRANCH", default_value = defaults::BRANCH)]
    pub branch: String,

    /// Watch for custom resources in all namespaces, if false only the install namespace is watched
    #[arg(
        long,
        env = "BOOTSTRAP_WATCH_ALL_NAMESPACES",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub watch_all_namespaces: bool,

    /// Deny ingress access to the toolkit controllers from other namespaces using network policies
    #[arg(
        long,
        env = "BOOTSTRAP_NETWORK_POLICY",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub network_policy: bool,

    /// Log level of the controllers, can be debug, info or error
    #[arg(long, env = "BOOTSTRAP_LOG_LEVEL", default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// Path to a local manifests directory
    #[arg(long = "manifests", env = "BOOTSTRAP_MANIFESTS", hide = true)]
    pub manifests_path: Option<PathBuf>,

    /// Git repository URL, e.g. ssh://git@github.com/org/fleet
    #[arg(long, env = "BOOTSTRAP_URL")]
    pub url: Url,

    /// Repository path the cluster syncs from
    #[arg(long, env = "BOOTSTRAP_PATH", default_value = "")]
    pub path: String,

    /// Namespace the toolkit is installed in
    #[arg(short = 'n', long, env = "BOOTSTRAP_NAMESPACE", default_value = defaults::NAMESPACE)]
    pub namespace: String,

    /// Source sync interval
    #[arg(long, env = "BOOTSTRAP_INTERVAL", default_value = defaults::INTERVAL, value_parser = parse_duration)]
    pub interval: Duration,

    /// Timeout for rollouts and readiness waits
    #[arg(long, env = "BOOTSTRAP_TIMEOUT", default_value = defaults::TIMEOUT, value_parser = parse_duration)]
    pub timeout: Duration,

    /// Path to the kubeconfig file, or a list of files joined like `KUBECONFIG`.
    /// When unset, `KUBECONFIG` and the default locations are used.
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, env = "BOOTSTRAP_CONTEXT")]
    pub context: Option<String>,
}

impl Cli {
    /// Split the flags into the immutable bootstrap configuration and the sync target
    pub fn into_parts(self) -> (BootstrapConfig, SyncTarget) {
        let config = BootstrapConfig {
            version: self.toolkit_version,
            components: self
                .components
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            registry: self.registry,
            image_pull_secret: self.image_pull_secret,
            arch: self.arch,
            branch: self.branch,
            watch_all_namespaces: self.watch_all_namespaces,
            network_policy: self.network_policy,
            log_level: self.log_level,
            manifests_path: self.manifests_path,
            timeout: self.timeout,
        };

        let target = SyncTarget {
            url: self.url,
            path: self.path,
            namespace: self.namespace,
            interval: self.interval,
        };

        (config, target)
    }
}
