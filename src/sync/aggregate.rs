// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The kustomization-of-kustomizations that makes a manifests directory applyable with `-k`

use crate::constants::files::KUSTOMIZATION_FILE;
use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationFile {
    pub api_version: String,
    pub kind: String,
    pub resources: Vec<String>,
}

/// Write `kustomization.yaml` listing every other YAML file in `dir`, sorted by name
pub async fn write_kustomization_file(dir: &Path) -> Result<PathBuf> {
    let mut resources = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|source| BootstrapError::WriteManifest {
            path: dir.to_path_buf(),
            source,
        })?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| BootstrapError::WriteManifest {
            path: dir.to_path_buf(),
            source,
        })?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_yaml = name.ends_with(".yaml") || name.ends_with(".yml");
        if is_yaml && name != KUSTOMIZATION_FILE {
            resources.push(name);
        }
    }
    resources.sort();

    let file = KustomizationFile {
        api_version: "kustomize.config.k8s.io/v1beta1".to_string(),
        kind: "Kustomization".to_string(),
        resources,
    };
    let data = serde_yaml::to_string(&file).map_err(|source| BootstrapError::Serialize {
        kind: "kustomization file",
        source,
    })?;

    let path = dir.join(KUSTOMIZATION_FILE);
    tokio::fs::write(&path, data)
        .await
        .map_err(|source| BootstrapError::WriteManifest {
            path: path.clone(),
            source,
        })?;

    debug!("Wrote {} with {} resources", path.display(), file.resources.len());
    Ok(path)
}
