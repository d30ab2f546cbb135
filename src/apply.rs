// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Applying manifests to the cluster and waiting for controller rollouts

use crate::error::{BootstrapError, Result};
use crate::exec::run_command_with_env;
use crate::types::format_duration;
use futures::future::BoxFuture;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

pub use crate::exec::CommandError;

/// External apply mechanism. Implementations report success or failure only.
pub trait Applier: Send + Sync {
    /// Apply a single manifest file
    fn apply_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, std::result::Result<(), CommandError>>;

    /// Apply a kustomization directory
    fn apply_kustomization<'a>(
        &'a self,
        dir: &'a Path,
    ) -> BoxFuture<'a, std::result::Result<(), CommandError>>;

    /// Block until a deployment has rolled out or the timeout expires
    fn rollout_status<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, std::result::Result<(), CommandError>>;
}

/// [`Applier`] backed by the kubectl binary
#[derive(Debug, Clone, Default)]
pub struct Kubectl {
    /// Handed to kubectl as `KUBECONFIG`, so path lists work as well as single files
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
}

impl Kubectl {
    pub fn new(kubeconfig: Option<PathBuf>, context: Option<String>) -> Self {
        Self { kubeconfig, context }
    }

    fn args<I, S>(&self, rest: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = Vec::new();
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args.extend(rest.into_iter().map(Into::into));
        args
    }

    fn envs(&self) -> Vec<(&str, &OsStr)> {
        self.kubeconfig
            .iter()
            .map(|kubeconfig| ("KUBECONFIG", kubeconfig.as_os_str()))
            .collect()
    }

    async fn run(&self, args: Vec<String>) -> std::result::Result<(), CommandError> {
        run_command_with_env("kubectl", &args, &self.envs())
            .await
            .map(|_| ())
    }
}

impl Applier for Kubectl {
    fn apply_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, std::result::Result<(), CommandError>> {
        let args = self.args(["apply".to_string(), "-f".to_string(), path.display().to_string()]);
        Box::pin(self.run(args))
    }

    fn apply_kustomization<'a>(
        &'a self,
        dir: &'a Path,
    ) -> BoxFuture<'a, std::result::Result<(), CommandError>> {
        let args = self.args(["apply".to_string(), "-k".to_string(), dir.display().to_string()]);
        Box::pin(self.run(args))
    }

    fn rollout_status<'a>(
        &'a self,
        namespace: &'a str,
        deployment: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, std::result::Result<(), CommandError>> {
        let timeout = format_duration(timeout);
        let args = self.args([
            "-n",
            namespace,
            "rollout",
            "status",
            "deployment",
            deployment,
            "--timeout",
            timeout.as_str(),
        ]);
        Box::pin(self.run(args))
    }
}

/// Apply the install manifest, then wait for each component deployment in order.
///
/// The first failure aborts the remaining rollouts. Failures surface as
/// [`BootstrapError::InstallFailed`] with the command diagnostic as its source.
#[instrument(skip(applier, components), fields(manifest = %manifest.display()))]
pub async fn apply_install_manifests<A: Applier + ?Sized>(
    applier: &A,
    manifest: &Path,
    namespace: &str,
    components: &[&str],
    timeout: Duration,
) -> Result<()> {
    info!("Installing components in {} namespace", namespace);

    if let Err(e) = applier.apply_file(manifest).await {
        warn!("Applying install manifest failed: {}", e);
        return Err(BootstrapError::InstallFailed(e));
    }

    for deployment in components {
        if let Err(e) = applier.rollout_status(namespace, deployment, timeout).await {
            warn!("Rollout of deployment {} failed: {}", deployment, e);
            return Err(BootstrapError::InstallFailed(e));
        }
        info!("Deployment {} is ready", deployment);
    }

    info!("Install completed");
    Ok(())
}

/// Apply the generated sync manifests as a single kustomization
#[instrument(skip(applier), fields(dir = %dir.display()))]
pub async fn apply_sync_manifests<A: Applier + ?Sized>(applier: &A, dir: &Path) -> Result<()> {
    info!("Applying sync manifests");
    applier.apply_kustomization(dir).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fake::RecordingApplier;
    use super::*;
    use crate::constants::REQUIRED_COMPONENTS;
    use std::error::Error as _;

    #[tokio::test]
    async fn test_apply_then_rollout_each_component() {
        let applier = RecordingApplier::default();

        apply_install_manifests(
            &applier,
            Path::new("/tmp/manifest.yaml"),
            "flux-system",
            &REQUIRED_COMPONENTS,
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        assert_eq!(
            applier.calls(),
            vec![
                "apply-file",
                "rollout:source-controller",
                "rollout:kustomize-controller"
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_failure_skips_rollouts() {
        let applier = RecordingApplier::failing_on("apply-file");

        let err = apply_install_manifests(
            &applier,
            Path::new("/tmp/manifest.yaml"),
            "flux-system",
            &REQUIRED_COMPONENTS,
            Duration::from_secs(60),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "install failed");
        assert!(err.source().unwrap().to_string().contains("simulated failure"));
        assert_eq!(applier.calls(), vec!["apply-file"]);
    }

    #[tokio::test]
    async fn test_rollout_failure_aborts_remaining() {
        let applier = RecordingApplier::failing_on("rollout:source-controller");

        let err = apply_install_manifests(
            &applier,
            Path::new("/tmp/manifest.yaml"),
            "flux-system",
            &REQUIRED_COMPONENTS,
            Duration::from_secs(60),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BootstrapError::InstallFailed(_)));
        assert_eq!(applier.calls(), vec!["apply-file", "rollout:source-controller"]);
    }

    #[tokio::test]
    async fn test_sync_apply_error_is_not_collapsed() {
        let applier = RecordingApplier::failing_on("apply-kustomization");

        let err = apply_sync_manifests(&applier, Path::new("/tmp/dir"))
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Apply(_)));
        assert!(err.to_string().contains("simulated failure"));
    }

    #[test]
    fn test_kubectl_args_include_context() {
        let kubectl = Kubectl::new(Some(PathBuf::from("/home/me/.kube/config")), Some("kind".to_string()));
        assert_eq!(
            kubectl.args(["apply", "-f", "x.yaml"]),
            vec!["--context", "kind", "apply", "-f", "x.yaml"]
        );
    }

    #[test]
    fn test_kubectl_kubeconfig_list_goes_through_env() {
        let kubectl = Kubectl::new(Some(PathBuf::from("/a/config:/b/config")), None);
        assert_eq!(
            kubectl.envs(),
            vec![("KUBECONFIG", OsStr::new("/a/config:/b/config"))]
        );
        assert!(Kubectl::default().envs().is_empty());
    }

    #[test]
    fn test_kubectl_args_default() {
        assert_eq!(Kubectl::default().args(["get", "pods"]), vec!["get", "pods"]);
    }
}
