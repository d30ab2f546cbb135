// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gitops_bootstrap::apply::Kubectl;
use gitops_bootstrap::cli::Cli;
use gitops_bootstrap::deploy_key::SshKeygen;
use gitops_bootstrap::install::KustomizeRenderer;
use gitops_bootstrap::kubernetes::create_client;
use gitops_bootstrap::Bootstrapper;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let kubeconfig = cli.kubeconfig.clone();
    let context = cli.context.clone();
    let (config, target) = cli.into_parts();

    // Fail on bad flags before connecting anywhere
    config.validate()?;

    let client = create_client(kubeconfig.as_deref(), context.clone()).await?;
    info!("Connected to Kubernetes cluster");

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling bootstrap");
                cancel.cancel();
            }
        }
    });

    let bootstrapper = Bootstrapper::new(
        client,
        config,
        Arc::new(Kubectl::new(kubeconfig, context)),
        Arc::new(KustomizeRenderer),
        Arc::new(SshKeygen),
    );

    let report = bootstrapper.run(&target, &cancel).await?;

    if let Some(public_key) = report.deploy_key {
        println!("Add the following deploy key to {} with read access:", target.url);
        println!("{}", public_key.trim_end());
    }
    for object in &report.applied {
        info!("Applied {}", object);
    }

    Ok(())
}
