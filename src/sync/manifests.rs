// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! GitRepository and Kustomization objects for the cluster's own sync

use crate::constants::{files, KUSTOMIZATION_INTERVAL};
use crate::error::{BootstrapError, Result};
use crate::install::manifests_dir;
use crate::sync::aggregate::write_kustomization_file;
use crate::types::{
    format_duration, CrossNamespaceSourceReference, GitRepository, GitRepositoryRef,
    GitRepositorySpec, Kustomization, KustomizationSpec, LocalObjectReference,
};
use kube::api::ObjectMeta;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Paths of the generated sync manifests
#[derive(Debug, Clone, PartialEq)]
pub struct SyncManifests {
    /// Directory to apply with `kubectl apply -k`
    pub dir: PathBuf,
    pub source: PathBuf,
    pub kustomization: PathBuf,
}

fn object_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Git source polling `url` every `interval`, authenticated by the secret named `name`
pub fn build_git_repository(
    url: &str,
    branch: &str,
    name: &str,
    namespace: &str,
    interval: Duration,
) -> GitRepository {
    GitRepository {
        metadata: object_meta(name, namespace),
        spec: GitRepositorySpec {
            url: url.to_string(),
            interval: format_duration(interval),
            reference: Some(GitRepositoryRef {
                branch: Some(branch.to_string()),
                ..Default::default()
            }),
            secret_ref: Some(LocalObjectReference {
                name: name.to_string(),
            }),
        },
        status: None,
    }
}

/// Kustomization applying `./<target_path>` from the Git source named `name`, with pruning
pub fn build_kustomization(name: &str, namespace: &str, target_path: &str) -> Kustomization {
    Kustomization {
        metadata: object_meta(name, namespace),
        spec: KustomizationSpec {
            interval: format_duration(KUSTOMIZATION_INTERVAL),
            path: format!("./{}", target_path.trim_start_matches("./")),
            prune: true,
            source_ref: CrossNamespaceSourceReference {
                kind: "GitRepository".to_string(),
                name: name.to_string(),
                namespace: None,
            },
            validation: Some("client".to_string()),
        },
        status: None,
    }
}

async fn write_yaml<T: Serialize>(kind: &'static str, object: &T, path: &Path) -> Result<()> {
    let data =
        serde_yaml::to_string(object).map_err(|source| BootstrapError::Serialize { kind, source })?;
    tokio::fs::write(path, data)
        .await
        .map_err(|source| BootstrapError::WriteManifest {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the Git source, the Kustomization and the aggregating kustomization file
/// under `<tmp>/<targetPath>/<namespace>`
#[instrument(skip(tmp_dir, interval))]
pub async fn generate_sync_manifests(
    url: &str,
    branch: &str,
    name: &str,
    namespace: &str,
    target_path: &str,
    tmp_dir: &Path,
    interval: Duration,
) -> Result<SyncManifests> {
    info!("Generating sync manifests");

    let dir = manifests_dir(tmp_dir, target_path, namespace);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| BootstrapError::CreateDir {
            path: dir.clone(),
            source,
        })?;

    let source = dir.join(files::SOURCE_MANIFEST);
    let git_repository = build_git_repository(url, branch, name, namespace, interval);
    write_yaml("GitRepository", &git_repository, &source).await?;

    let kustomization = dir.join(files::KUSTOMIZATION_MANIFEST);
    write_yaml(
        "Kustomization",
        &build_kustomization(name, namespace, target_path),
        &kustomization,
    )
    .await?;

    write_kustomization_file(&dir).await?;

    Ok(SyncManifests {
        dir,
        source,
        kustomization,
    })
}
