// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Status conditions shared by the toolkit custom resources

use serde::{Deserialize, Serialize};

/// Condition type reported once a controller has reconciled an object
pub const READY_CONDITION: &str = "Ready";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Readiness of an object as read off its `Ready` condition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// `Ready=True`
    Ready,
    /// No `Ready` condition yet, or `Ready=Unknown`
    Pending,
    /// `Ready=False`, carrying the condition message
    Failed(String),
}

impl Readiness {
    /// Derive readiness from a list of status conditions
    pub fn from_conditions(conditions: Option<&[Condition]>) -> Self {
        let Some(ready) = conditions
            .unwrap_or_default()
            .iter()
            .find(|c| c.condition_type == READY_CONDITION)
        else {
            return Readiness::Pending;
        };

        match ready.status.as_str() {
            "True" => Readiness::Ready,
            "False" => Readiness::Failed(
                ready
                    .message
                    .clone()
                    .or_else(|| ready.reason.clone())
                    .unwrap_or_else(|| "Ready condition is False".to_string()),
            ),
            _ => Readiness::Pending,
        }
    }
}

#[cfg(test)]
pub(crate) fn make_condition(condition_type: &str, status: &str, message: Option<&str>) -> Condition {
    Condition {
        condition_type: condition_type.to_string(),
        status: status.to_string(),
        reason: None,
        message: message.map(str::to_string),
        last_transition_time: None,
    }
}
