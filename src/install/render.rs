// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rendering the toolkit installation manifest with kustomize

use crate::exec::{run_command, CommandError};
use crate::install::InstallOptions;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serializing kustomization failed: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("rendering timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns install options into a multi-document installation manifest
pub trait ManifestRenderer: Send + Sync {
    fn render<'a>(&'a self, options: &'a InstallOptions) -> BoxFuture<'a, Result<Bytes, RenderError>>;
}

/// [`ManifestRenderer`] that builds a kustomization over the component bases
/// and renders it with `kubectl kustomize`
#[derive(Debug, Clone, Default)]
pub struct KustomizeRenderer;

impl ManifestRenderer for KustomizeRenderer {
    fn render<'a>(&'a self, options: &'a InstallOptions) -> BoxFuture<'a, Result<Bytes, RenderError>> {
        Box::pin(render_with_kustomize(options))
    }
}

#[instrument(skip(options), fields(version = %options.version, namespace = %options.namespace))]
async fn render_with_kustomize(options: &InstallOptions) -> Result<Bytes, RenderError> {
    let scratch = tempfile::Builder::new()
        .prefix("toolkit-install")
        .tempdir()?;

    let kustomization = serde_yaml::to_string(&build_kustomization(options))?;
    debug!("Generated install kustomization:\n{}", kustomization);
    tokio::fs::write(scratch.path().join("kustomization.yaml"), kustomization).await?;

    let output = scratch.path().join(&options.manifests_file);
    let args = vec![
        "kustomize".to_string(),
        scratch.path().display().to_string(),
        "-o".to_string(),
        output.display().to_string(),
    ];

    tokio::time::timeout(options.timeout, run_command("kubectl", &args))
        .await
        .map_err(|_| RenderError::Timeout(options.timeout))??;

    let rendered = tokio::fs::read(&output).await?;
    info!("Rendered install manifest ({} bytes)", rendered.len());
    Ok(Bytes::from(rendered))
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KustomizeFile {
    api_version: String,
    kind: String,
    namespace: String,
    resources: Vec<String>,
    images: Vec<ImageOverride>,
    patches: Vec<PatchSpec>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct ImageOverride {
    name: String,
    new_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_tag: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
struct PatchSpec {
    target: PatchTarget,
    patch: String,
}

#[derive(Serialize, Debug, PartialEq)]
struct PatchTarget {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

fn deployment_patch(name: Option<&str>, ops: serde_json::Value) -> PatchSpec {
    PatchSpec {
        target: PatchTarget {
            kind: "Deployment".to_string(),
            name: name.map(str::to_string),
        },
        patch: ops.to_string(),
    }
}

fn add_arg(arg: String) -> serde_json::Value {
    json!({"op": "add", "path": "/spec/template/spec/containers/0/args/-", "value": arg})
}

/// Git ref of the component bases for a toolkit version
fn base_ref(version: &str) -> &str {
    if version == "latest" {
        "main"
    } else {
        version
    }
}

fn is_local(base_url: &str) -> bool {
    Path::new(base_url).is_absolute() || base_url.starts_with("./") || base_url.starts_with("../")
}

fn resource(base_url: &str, sub_path: &str, version: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if is_local(base) {
        format!("{}/{}", base, sub_path)
    } else {
        format!("{}/{}?ref={}", base, sub_path, base_ref(version))
    }
}

pub(crate) fn build_kustomization(options: &InstallOptions) -> KustomizeFile {
    let mut resources: Vec<String> = options
        .components
        .iter()
        .map(|c| resource(&options.base_url, &format!("bases/{}", c), &options.version))
        .collect();
    if options.network_policy {
        resources.push(resource(&options.base_url, "policies", &options.version));
    }

    let images = options
        .components
        .iter()
        .map(|c| ImageOverride {
            name: format!("fluxcd/{}", c),
            new_name: format!("{}/{}", options.registry.trim_end_matches('/'), c),
            new_tag: (options.version != "latest").then(|| options.version.clone()),
        })
        .collect();

    let mut common_ops = vec![
        json!({
            "op": "add",
            "path": "/spec/template/spec/nodeSelector",
            "value": {"kubernetes.io/arch": options.arch},
        }),
        add_arg(format!("--log-level={}", options.log_level)),
        add_arg(format!("--watch-all-namespaces={}", options.watch_all_namespaces)),
    ];
    if !options.image_pull_secret.is_empty() {
        common_ops.push(json!({
            "op": "add",
            "path": "/spec/template/spec/imagePullSecrets",
            "value": [{"name": options.image_pull_secret}],
        }));
    }

    let mut patches = vec![deployment_patch(None, serde_json::Value::Array(common_ops))];

    let notifications = options
        .components
        .iter()
        .any(|c| c == &options.notification_controller);
    if notifications {
        let events_addr = format!("--events-addr=http://{}/", options.notification_controller);
        for component in options
            .components
            .iter()
            .filter(|c| *c != &options.notification_controller)
        {
            patches.push(deployment_patch(
                Some(component.as_str()),
                json!([add_arg(events_addr.clone())]),
            ));
        }
    }

    KustomizeFile {
        api_version: "kustomize.config.k8s.io/v1beta1".to_string(),
        kind: "Kustomization".to_string(),
        namespace: options.namespace.clone(),
        resources,
        images,
        patches,
    }
}
