// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deploy key provisioning: SSH keypair, Git host key and the secret holding both

use crate::constants::{secret_keys, FIELD_MANAGER, HOST_KEY_SCAN_TIMEOUT_SECS};
use crate::error::{BootstrapError, Result};
use crate::exec::run_command;
use futures::future::BoxFuture;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use url::Url;

/// An SSH keypair in OpenSSH formats
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Keypair generation and host key scanning
pub trait KeyProvider: Send + Sync {
    fn generate_key_pair(&self) -> BoxFuture<'_, Result<KeyPair>>;

    /// Return the known_hosts line(s) for `host:port`
    fn scan_host_key<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<String>>;
}

/// [`KeyProvider`] backed by the OpenSSH `ssh-keygen` and `ssh-keyscan` tools
#[derive(Debug, Clone, Default)]
pub struct SshKeygen;

impl SshKeygen {
    async fn keygen() -> Result<KeyPair> {
        let dir = tempfile::Builder::new()
            .prefix("deploy-key")
            .tempdir()
            .map_err(|e| BootstrapError::DeployKey(format!("creating key dir: {}", e)))?;
        let identity = dir.path().join(secret_keys::IDENTITY);

        let args = [
            "-q",
            "-t",
            "rsa",
            "-b",
            "2048",
            "-m",
            "PEM",
            "-N",
            "",
            "-C",
            FIELD_MANAGER,
            "-f",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(identity.display().to_string()))
        .collect::<Vec<_>>();

        run_command("ssh-keygen", &args)
            .await
            .map_err(|e| BootstrapError::DeployKey(e.to_string()))?;

        let read = |path: std::path::PathBuf| async move {
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| BootstrapError::DeployKey(format!("reading {}: {}", path.display(), e)))
        };

        Ok(KeyPair {
            private_key: read(identity.clone()).await?,
            public_key: read(identity.with_extension("pub")).await?,
        })
    }

    async fn keyscan(host: &str, port: u16) -> Result<String> {
        let args = vec![
            "-T".to_string(),
            HOST_KEY_SCAN_TIMEOUT_SECS.to_string(),
            "-p".to_string(),
            port.to_string(),
            host.to_string(),
        ];

        let output = run_command("ssh-keyscan", &args)
            .await
            .map_err(|e| BootstrapError::DeployKey(e.to_string()))?;

        let known_hosts = output
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");

        if known_hosts.is_empty() {
            return Err(BootstrapError::DeployKey(format!(
                "no host key found for {}:{}",
                host, port
            )));
        }
        Ok(known_hosts)
    }
}

impl KeyProvider for SshKeygen {
    fn generate_key_pair(&self) -> BoxFuture<'_, Result<KeyPair>> {
        Box::pin(Self::keygen())
    }

    fn scan_host_key<'a>(&'a self, host: &'a str, port: u16) -> BoxFuture<'a, Result<String>> {
        Box::pin(Self::keyscan(host, port))
    }
}

/// Host and SSH port of a repository URL
pub fn ssh_host(url: &Url) -> Result<(String, u16)> {
    let host = url.host_str().ok_or_else(|| BootstrapError::InvalidUrl {
        url: url.to_string(),
        reason: "missing host".to_string(),
    })?;
    Ok((host.to_string(), url.port().unwrap_or(22)))
}

/// The secret consumed by the GitRepository's `secretRef`
pub fn build_deploy_key_secret(namespace: &str, pair: &KeyPair, known_hosts: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([
            (secret_keys::IDENTITY.to_string(), pair.private_key.clone()),
            (secret_keys::IDENTITY_PUB.to_string(), pair.public_key.clone()),
            (secret_keys::KNOWN_HOSTS.to_string(), known_hosts.to_string()),
        ])),
        ..Default::default()
    }
}

/// Create or replace a secret via server-side apply
#[instrument(skip(client, secret), fields(name = ?secret.metadata.name))]
pub async fn upsert_secret(client: &Client, namespace: &str, secret: &Secret) -> Result<Secret> {
    let name = secret.metadata.name.clone().unwrap_or_else(|| namespace.to_string());
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    let pp = PatchParams::apply(FIELD_MANAGER).force();
    Ok(secrets.patch(&name, &pp, &Patch::Apply(secret)).await?)
}

/// Generate a keypair, scan the Git host and store both in the namespace's deploy key secret.
/// Returns the public key to register with the Git provider.
#[instrument(skip(client, keys, url), fields(host = ?url.host_str()))]
pub async fn generate_deploy_key<P: KeyProvider + ?Sized>(
    client: &Client,
    keys: &P,
    url: &Url,
    namespace: &str,
) -> Result<String> {
    info!("Generating deploy key");
    let pair = keys.generate_key_pair().await?;

    let (host, port) = ssh_host(url)?;
    let known_hosts = keys.scan_host_key(&host, port).await?;

    let secret = build_deploy_key_secret(namespace, &pair, &known_hosts);
    upsert_secret(client, namespace, &secret).await?;

    info!("Deploy key secret {0}/{0} applied", namespace);
    Ok(pair.public_key)
}
