// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded polling until a toolkit object reports `Ready`

use crate::error::{BootstrapError, Result};
use crate::types::{format_duration, GitRepository, Kustomization, Readiness};
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

#[derive(Error, Debug)]
pub enum PollError {
    #[error("timed out after {}", format_duration(*.0))]
    Timeout(Duration),

    /// The object itself reports a failure
    #[error("{0}")]
    Failed(String),

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("cancelled")]
    Cancelled,
}

/// Interval and overall timeout of a readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Call `check` immediately, then every `interval`, until it reports ready.
///
/// Terminal outcomes: ready, the check reporting failure, the check returning an
/// error, the timeout expiring, or `cancel` firing. Nothing is retried beyond the
/// loop itself. The last check happens at the deadline, so the loop never runs
/// longer than `timeout` plus one check. A timeout too large to represent as an
/// instant never expires.
pub async fn poll_immediate<F, Fut>(
    settings: PollSettings,
    cancel: &CancellationToken,
    mut check: F,
) -> std::result::Result<(), PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Readiness, kube::Error>>,
{
    let deadline = Instant::now().checked_add(settings.timeout);

    loop {
        let readiness = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            result = check() => result?,
        };

        match readiness {
            Readiness::Ready => return Ok(()),
            Readiness::Failed(message) => return Err(PollError::Failed(message)),
            Readiness::Pending => trace!("Not ready yet"),
        }

        let delay = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(PollError::Timeout(settings.timeout));
                }
                settings.interval.min(deadline - now)
            }
            None => settings.interval,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = sleep(delay) => {}
        }
    }
}

/// A namespaced toolkit object carrying a `Ready` condition
pub trait ReportsReadiness:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()> + DeserializeOwned + Clone + Debug
{
    const KIND: &'static str;

    fn readiness(&self) -> Readiness;
}

impl ReportsReadiness for GitRepository {
    const KIND: &'static str = "GitRepository";

    fn readiness(&self) -> Readiness {
        GitRepository::readiness(self)
    }
}

impl ReportsReadiness for Kustomization {
    const KIND: &'static str = "Kustomization";

    fn readiness(&self) -> Readiness {
        Kustomization::readiness(self)
    }
}

/// Read the object fresh from the API server and report its readiness
pub async fn check_ready<K: ReportsReadiness>(
    api: &Api<K>,
    name: &str,
) -> std::result::Result<Readiness, kube::Error> {
    let object = api.get(name).await?;
    let readiness = object.readiness();
    debug!("{} {} readiness: {:?}", K::KIND, name, readiness);
    Ok(readiness)
}

/// Poll a namespaced object until it reports ready
#[instrument(skip(client, settings, cancel), fields(kind = %K::KIND))]
pub async fn wait_for_ready<K: ReportsReadiness>(
    client: &Client,
    name: &str,
    namespace: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<()> {
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let api = &api;

    poll_immediate(settings, cancel, move || check_ready(api, name))
        .await
        .map_err(|source| match source {
            PollError::Cancelled => BootstrapError::Cancelled,
            source => BootstrapError::Readiness {
                kind: K::KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
                source,
            },
        })?;

    info!("{} {}/{} is ready", K::KIND, namespace, name);
    Ok(())
}

/// Wait for the Git source first, then the Kustomization that consumes it.
/// The Kustomization is never queried before the source is ready.
pub async fn wait_for_sync(
    client: &Client,
    name: &str,
    namespace: &str,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<()> {
    info!("Waiting for cluster sync");
    wait_for_ready::<GitRepository>(client, name, namespace, settings, cancel).await?;
    wait_for_ready::<Kustomization>(client, name, namespace, settings, cancel).await?;
    Ok(())
}
