// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotency guards deciding which bootstrap side effects are still needed

use crate::error::{BootstrapError, ReadErrorKind, Result};
use crate::types::Kustomization;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info, instrument, warn};

/// Fetch `namespace/namespace`, mapping only NotFound to `None`
async fn get_named_after_namespace<K>(
    client: &Client,
    kind: &'static str,
    namespace: &str,
) -> Result<Option<K>>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + DeserializeOwned + Clone + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);

    match api.get(namespace).await {
        Ok(object) => Ok(Some(object)),
        Err(e) => match ReadErrorKind::classify(&e) {
            ReadErrorKind::NotFound => Ok(None),
            class => {
                warn!("Reading {} {}/{} failed: {}", kind, namespace, namespace, e);
                Err(BootstrapError::ClusterRead {
                    kind,
                    namespace: namespace.to_string(),
                    name: namespace.to_string(),
                    class,
                    source: e,
                })
            }
        },
    }
}

/// Install unless the sync Kustomization exists and has applied a revision
#[instrument(skip(client))]
pub async fn should_install_manifests(client: &Client, namespace: &str) -> Result<bool> {
    let Some(kustomization) =
        get_named_after_namespace::<Kustomization>(client, "Kustomization", namespace).await?
    else {
        debug!("No Kustomization {0}/{0}, installing", namespace);
        return Ok(true);
    };

    if kustomization.has_applied_revision() {
        info!("Kustomization {0}/{0} has applied a revision, skipping install", namespace);
        Ok(false)
    } else {
        debug!("Kustomization {0}/{0} has not applied a revision yet, installing", namespace);
        Ok(true)
    }
}

/// Create a deploy key only when no secret named after the namespace exists
#[instrument(skip(client))]
pub async fn should_create_deploy_key(client: &Client, namespace: &str) -> Result<bool> {
    let existing = get_named_after_namespace::<Secret>(client, "Secret", namespace).await?;
    if existing.is_some() {
        info!("Deploy key secret {0}/{0} already exists", namespace);
    }
    Ok(existing.is_none())
}
