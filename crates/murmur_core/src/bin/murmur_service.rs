/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use murmur_core::{api, config::ServiceConfig, Engine};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = ServiceConfig::load(std::env::args().skip(1), |k| std::env::var(k).ok())?;
    let addr = cfg.bind_addr()?;
    info!("murmur service {} starting", murmur_core::version());
    info!("db: {}", cfg.db_path.display());

    let engine = Engine::open(&cfg)?;
    let app = api::router(engine, cfg.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("murmur listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("ctrl_c handler failed: {e}");
            }
            info!("shutdown requested");
        })
        .await
        .context("serve")?;
    Ok(())
}
