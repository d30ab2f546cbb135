// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::condition::{Condition, Readiness};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[kube(group = "kustomize.toolkit.fluxcd.io", version = "v1beta1", kind = "Kustomization")]
#[kube(namespaced)]
#[kube(status = "KustomizationStatus")]
#[serde(rename_all = "camelCase")]
pub struct KustomizationSpec {
    /// Go duration string, e.g. `10m0s`
    pub interval: String,
    pub path: String,
    pub prune: bool,
    pub source_ref: CrossNamespaceSourceReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrossNamespaceSourceReference {
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KustomizationStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default)]
    pub last_applied_revision: String,
    #[serde(default)]
    pub last_attempted_revision: String,
}

impl Kustomization {
    /// Readiness as reported by the kustomize controller
    pub fn readiness(&self) -> Readiness {
        Readiness::from_conditions(
            self.status
                .as_ref()
                .and_then(|s| s.conditions.as_deref()),
        )
    }

    /// Whether the controller has applied at least one revision of the source
    pub fn has_applied_revision(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| !s.last_applied_revision.is_empty())
    }
}
