// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Target cluster client creation and kubeconfig utilities

use crate::error::{BootstrapError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Connection timeout for the target cluster's API server
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Read timeout for single API requests
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Read a kubeconfig from a single file or a `KUBECONFIG`-style path list.
/// Later files are merged into earlier ones, the first file wins on conflicts.
pub fn read_kubeconfig(paths: &Path) -> Result<Kubeconfig> {
    let mut merged: Option<Kubeconfig> = None;

    for path in std::env::split_paths(paths.as_os_str()).filter(|p| !p.as_os_str().is_empty()) {
        debug!("Loading kubeconfig from {}", path.display());
        let next = Kubeconfig::read_from(&path).map_err(|e| {
            BootstrapError::Kubeconfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        merged = Some(match merged {
            Some(current) => current.merge(next).map_err(|e| {
                BootstrapError::Kubeconfig(format!("Failed to merge {}: {}", path.display(), e))
            })?,
            None => next,
        });
    }

    merged.ok_or_else(|| BootstrapError::Kubeconfig(format!("No kubeconfig in {:?}", paths)))
}

/// Create a client for the target cluster.
///
/// An explicit kubeconfig (file or path list) or context wins; otherwise the configuration is inferred
/// from `KUBECONFIG`, `~/.kube/config` or the in-cluster service account.
#[instrument]
pub async fn create_client(kubeconfig: Option<&Path>, context: Option<String>) -> Result<Client> {
    let options = KubeConfigOptions {
        context,
        ..Default::default()
    };

    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = read_kubeconfig(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| BootstrapError::Kubeconfig(format!("Failed to create config: {}", e)))?
        }
        None if options.context.is_some() => Config::from_kubeconfig(&options)
            .await
            .map_err(|e| BootstrapError::Kubeconfig(format!("Failed to create config: {}", e)))?,
        None => Config::infer()
            .await
            .map_err(|e| BootstrapError::Kubeconfig(format!("Failed to infer config: {}", e)))?,
    };

    config.connect_timeout = Some(CONNECT_TIMEOUT);
    config.read_timeout = Some(READ_TIMEOUT);

    Client::try_from(config)
        .map_err(|e| BootstrapError::Kubeconfig(format!("Failed to create client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: prod
  cluster:
    server: https://prod.example.com:6443
- name: staging
  cluster:
    server: https://staging.example.com:6443
contexts:
- name: prod
  context:
    cluster: prod
    user: admin
- name: staging
  context:
    cluster: staging
    user: admin
current-context: prod
users:
- name: admin
  user:
    token: not-a-real-token
"#;

    const STAGING_KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: qa
  cluster:
    server: https://qa.example.com:6443
contexts:
- name: qa
  context:
    cluster: qa
    user: qa-admin
users:
- name: qa-admin
  user:
    token: not-a-real-token-either
"#;

    fn write_kubeconfig_content(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    fn write_kubeconfig() -> tempfile::NamedTempFile {
        write_kubeconfig_content(KUBECONFIG)
    }

    fn path_list(files: &[&tempfile::NamedTempFile]) -> std::path::PathBuf {
        std::env::join_paths(files.iter().map(|f| f.path())).unwrap().into()
    }

    #[test]
    fn test_read_kubeconfig_merges_path_list() {
        let first = write_kubeconfig();
        let second = write_kubeconfig_content(STAGING_KUBECONFIG);

        let merged = read_kubeconfig(&path_list(&[&first, &second])).unwrap();

        let contexts: Vec<_> = merged.contexts.iter().map(|c| c.name.as_str()).collect();
        assert!(contexts.contains(&"prod"));
        assert!(contexts.contains(&"qa"));
        assert_eq!(merged.current_context.as_deref(), Some("prod"));
    }

    #[tokio::test]
    async fn test_create_client_with_context_from_second_file() {
        let first = write_kubeconfig();
        let second = write_kubeconfig_content(STAGING_KUBECONFIG);

        let list = path_list(&[&first, &second]);

        assert!(create_client(Some(list.as_path()), Some("qa".to_string()))
            .await
            .is_ok());
    }

    #[test]
    fn test_read_kubeconfig_missing_entry_is_rejected() {
        let first = write_kubeconfig();
        let list = std::env::join_paths([first.path(), Path::new("/nonexistent/kubeconfig")]).unwrap();

        let err = read_kubeconfig(Path::new(&list)).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kubeconfig"));
    }

    #[tokio::test]
    async fn test_create_client_from_file() {
        let file = write_kubeconfig();
        let client = create_client(Some(file.path()), None).await.unwrap();
        assert_eq!(client.default_namespace(), "default");
    }

    #[tokio::test]
    async fn test_unknown_context_is_rejected() {
        let file = write_kubeconfig();
        let err = create_client(Some(file.path()), Some("nope".to_string()))
            .await
            .err().unwrap();
        assert!(matches!(err, BootstrapError::Kubeconfig(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let err = create_client(Some(Path::new("/nonexistent/kubeconfig")), None)
            .await
            .err().unwrap();
        assert!(err.to_string().starts_with("Failed to load kubeconfig"));
    }
}
