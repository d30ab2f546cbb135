// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The end-to-end bootstrap workflow

use crate::apply::{apply_install_manifests, apply_sync_manifests, Applier};
use crate::config::{BootstrapConfig, SyncTarget};
use crate::constants::{poll, REQUIRED_COMPONENTS};
use crate::deploy_key::{generate_deploy_key, KeyProvider};
use crate::error::{BootstrapError, Result};
use crate::guards::{should_create_deploy_key, should_install_manifests};
use crate::install::{generate_install_manifests, ManifestRenderer};
use crate::readiness::{wait_for_sync, PollSettings};
use crate::sync::generate_sync_manifests;
use kube::Client;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Outcome of a successful bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Whether the toolkit components were (re)installed in this run
    pub installed: bool,
    /// Public key of a newly generated deploy key, to be registered with the Git provider
    pub deploy_key: Option<String>,
    /// `Kind/namespace/name` of the sync objects applied
    pub applied: Vec<String>,
}

/// Sequences install, deploy key provisioning, sync manifest apply and readiness waits
pub struct Bootstrapper {
    client: Client,
    config: BootstrapConfig,
    applier: Arc<dyn Applier>,
    renderer: Arc<dyn ManifestRenderer>,
    keys: Arc<dyn KeyProvider>,
    poll_interval: Duration,
}

impl Bootstrapper {
    pub fn new(
        client: Client,
        config: BootstrapConfig,
        applier: Arc<dyn Applier>,
        renderer: Arc<dyn ManifestRenderer>,
        keys: Arc<dyn KeyProvider>,
    ) -> Self {
        Self {
            client,
            config,
            applier,
            renderer,
            keys,
            poll_interval: poll::INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
            timeout: self.config.timeout,
        }
    }

    /// Bring the cluster to the synchronized state described by `target`.
    ///
    /// Each step is a precondition for the next and the first failure aborts the run.
    /// Re-running against a bootstrapped cluster skips the install and keeps the existing deploy key.
    #[instrument(skip(self, target, cancel), fields(namespace = %target.namespace, path = %target.path))]
    pub async fn run(&self, target: &SyncTarget, cancel: &CancellationToken) -> Result<BootstrapReport> {
        self.config.validate()?;

        let tmp_dir = tempfile::Builder::new()
            .prefix("gitops-bootstrap")
            .tempdir()
            .map_err(|source| BootstrapError::CreateDir {
                path: std::env::temp_dir(),
                source,
            })?;

        let namespace = target.namespace.as_str();

        let installed = if cancellable(cancel, should_install_manifests(&self.client, namespace)).await? {
            self.install(target, tmp_dir.path(), cancel).await?;
            true
        } else {
            info!("Toolkit already synchronized in {}, skipping install", namespace);
            false
        };

        let deploy_key = if cancellable(cancel, should_create_deploy_key(&self.client, namespace)).await? {
            let public_key = cancellable(
                cancel,
                generate_deploy_key(&self.client, self.keys.as_ref(), &target.url, namespace),
            )
            .await?;
            Some(public_key)
        } else {
            info!("Deploy key {0}/{0} exists, keeping it", namespace);
            None
        };

        let manifests = cancellable(
            cancel,
            generate_sync_manifests(
                target.url.as_str(),
                &self.config.branch,
                target.name(),
                namespace,
                &target.path,
                tmp_dir.path(),
                target.interval,
            ),
        )
        .await?;

        cancellable(cancel, apply_sync_manifests(self.applier.as_ref(), &manifests.dir)).await?;

        wait_for_sync(&self.client, target.name(), namespace, self.poll_settings(), cancel).await?;

        info!("Bootstrap finished");
        Ok(BootstrapReport {
            installed,
            deploy_key,
            applied: vec![
                format!("GitRepository/{}/{}", namespace, target.name()),
                format!("Kustomization/{}/{}", namespace, target.name()),
            ],
        })
    }

    async fn install(&self, target: &SyncTarget, tmp_dir: &Path, cancel: &CancellationToken) -> Result<()> {
        info!("Installing components");
        let manifest = cancellable(
            cancel,
            generate_install_manifests(
                &self.config,
                self.renderer.as_ref(),
                &target.path,
                &target.namespace,
                tmp_dir,
            ),
        )
        .await?;

        cancellable(
            cancel,
            apply_install_manifests(
                self.applier.as_ref(),
                &manifest,
                &target.namespace,
                &REQUIRED_COMPONENTS,
                self.config.timeout,
            ),
        )
        .await
    }
}

/// Race a step against cancellation; the step's future is dropped when `cancel` fires
async fn cancellable<T>(cancel: &CancellationToken, step: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BootstrapError::Cancelled),
        result = step => result,
    }
}
