// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generating the toolkit installation manifest.

pub mod render;

pub use render::{KustomizeRenderer, ManifestRenderer, RenderError};

use crate::config::BootstrapConfig;
use crate::constants::{defaults, files, NOTIFICATION_CONTROLLER, REQUIRED_COMPONENTS};
use crate::error::{BootstrapError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Options handed to the [`ManifestRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct InstallOptions {
    /// Local directory or kustomize remote holding `bases/<component>` and `policies`
    pub base_url: String,
    pub version: String,
    pub namespace: String,
    pub components: Vec<String>,
    pub registry: String,
    pub image_pull_secret: String,
    pub arch: String,
    pub watch_all_namespaces: bool,
    pub network_policy: bool,
    pub log_level: String,
    /// Name of the component other controllers send events to
    pub notification_controller: String,
    pub manifests_file: String,
    pub timeout: Duration,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            version: defaults::VERSION.to_string(),
            namespace: defaults::NAMESPACE.to_string(),
            components: REQUIRED_COMPONENTS.iter().map(|c| c.to_string()).collect(),
            registry: defaults::REGISTRY.to_string(),
            image_pull_secret: String::new(),
            arch: defaults::ARCH.to_string(),
            watch_all_namespaces: true,
            network_policy: true,
            log_level: defaults::LOG_LEVEL.to_string(),
            notification_controller: NOTIFICATION_CONTROLLER.to_string(),
            manifests_file: format!("{}.yaml", defaults::NAMESPACE),
            timeout: Duration::from_secs(300),
        }
    }
}

impl InstallOptions {
    /// Mirror the bootstrap configuration, falling back to the default base when no local manifests are given
    pub fn from_config(config: &BootstrapConfig, namespace: &str) -> Self {
        let base_url = match &config.manifests_path {
            Some(path) => path.display().to_string(),
            None => Self::default().base_url,
        };

        Self {
            base_url,
            version: config.version.clone(),
            namespace: namespace.to_string(),
            components: config.components.clone(),
            registry: config.registry.clone(),
            image_pull_secret: config.image_pull_secret.clone(),
            arch: config.arch.clone(),
            watch_all_namespaces: config.watch_all_namespaces,
            network_policy: config.network_policy,
            log_level: config.log_level.clone(),
            notification_controller: NOTIFICATION_CONTROLLER.to_string(),
            manifests_file: format!("{}.yaml", namespace),
            timeout: config.timeout,
        }
    }
}

/// Directory holding every manifest generated for a namespace: `<tmp>/<targetPath>/<namespace>`
pub fn manifests_dir(tmp_dir: &Path, target_path: &str, namespace: &str) -> PathBuf {
    let relative = target_path.trim_start_matches("./").trim_start_matches('/');
    tmp_dir.join(relative).join(namespace)
}

/// Render the install manifest and write it to `<tmp>/<targetPath>/<namespace>/toolkit-components.yaml`
#[instrument(skip(config, renderer, tmp_dir))]
pub async fn generate_install_manifests<R: ManifestRenderer + ?Sized>(
    config: &BootstrapConfig,
    renderer: &R,
    target_path: &str,
    namespace: &str,
    tmp_dir: &Path,
) -> Result<PathBuf> {
    let dir = manifests_dir(tmp_dir, target_path, namespace);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| BootstrapError::CreateDir {
            path: dir.clone(),
            source,
        })?;

    let manifest = dir.join(files::INSTALL_MANIFEST);
    let options = InstallOptions::from_config(config, namespace);

    let output = renderer
        .render(&options)
        .await
        .map_err(BootstrapError::Render)?;

    tokio::fs::write(&manifest, &output)
        .await
        .map_err(|source| BootstrapError::WriteManifest {
            path: manifest.clone(),
            source,
        })?;

    info!("Generated install manifest {}", manifest.display());
    Ok(manifest)
}


#[cfg(test)]
mod tests {
    use super::fake::{StaticRenderer, MANIFEST};
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_manifests_dir_is_deterministic() {
        let tmp = Path::new("/tmp/bootstrap");
        let expected = PathBuf::from("/tmp/bootstrap/clusters/prod/flux-system");

        assert_eq!(manifests_dir(tmp, "clusters/prod", "flux-system"), expected);
        assert_eq!(manifests_dir(tmp, "./clusters/prod", "flux-system"), expected);
        assert_eq!(manifests_dir(tmp, "/clusters/prod", "flux-system"), expected);
    }

    #[test]
    fn test_options_mirror_config() {
        let config = BootstrapConfig {
            registry: "registry.local".to_string(),
            image_pull_secret: "regcred".to_string(),
            watch_all_namespaces: false,
            ..test_config()
        };

        let options = InstallOptions::from_config(&config, "gitops");

        assert_eq!(options.base_url, defaults::BASE_URL);
        assert_eq!(options.namespace, "gitops");
        assert_eq!(options.manifests_file, "gitops.yaml");
        assert_eq!(options.registry, "registry.local");
        assert_eq!(options.image_pull_secret, "regcred");
        assert!(!options.watch_all_namespaces);
        assert_eq!(options.components, config.components);
    }

    #[test]
    fn test_options_use_local_manifests() {
        let config = BootstrapConfig {
            manifests_path: Some(PathBuf::from("/src/toolkit/manifests")),
            ..test_config()
        };

        let options = InstallOptions::from_config(&config, "flux-system");
        assert_eq!(options.base_url, "/src/toolkit/manifests");
    }

    #[tokio::test]
    async fn test_generate_writes_rendered_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = StaticRenderer::default();

        let path = generate_install_manifests(
            &test_config(),
            &renderer,
            "clusters/prod",
            "flux-system",
            tmp.path(),
        )
        .await
        .unwrap();

        assert_eq!(
            path,
            tmp.path().join("clusters/prod/flux-system/toolkit-components.yaml")
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), MANIFEST);
        assert_eq!(renderer.seen.lock().unwrap()[0].namespace, "flux-system");
    }

    #[tokio::test]
    async fn test_generate_wraps_render_error() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = StaticRenderer {
            fail: true,
            ..Default::default()
        };

        let err = generate_install_manifests(&test_config(), &renderer, "clusters/prod", "flux-system", tmp.path())
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Render(_)));
        assert!(err.to_string().starts_with("generating install manifests failed"));
        assert!(!tmp
            .path()
            .join("clusters/prod/flux-system/toolkit-components.yaml")
            .exists());
    }

    #[tokio::test]
    async fn test_generate_reports_dir_creation_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("clusters");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = generate_install_manifests(
            &test_config(),
            &StaticRenderer::default(),
            "clusters/prod",
            "flux-system",
            tmp.path(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("creating manifests dir failed"));
    }
}
