//! # usdxd
//!
//! Runs a single USDX replica over an in-memory database.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `USDX_*` environment overrides)
//! 2. Install the tracing subscriber at the configured level
//! 3. Wire the application and initialize the chain from the genesis file
//! 4. Replay blocks from stdin: one JSON transaction per line, a blank
//!    line closes the block
//! 5. With `export`, print the final state as a genesis document
//!
//! Every transaction result is written to stdout as one JSON line.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use shared_types::BlockHeader;
use usdx_app::{AppConfig, UsdxApp};
use usdx_store::InMemoryVersionedDb;

fn load_config() -> Result<AppConfig> {
    AppConfig::from_env().context("invalid configuration")
}

fn run_block(
    app: &mut UsdxApp,
    chain_id: &str,
    txs: &[String],
    out: &mut impl Write,
) -> Result<()> {
    let height = app.last_commit().map_or(0, |c| c.version) + 1;
    app.begin_block(BlockHeader::new(chain_id, height, height))?;
    for tx in txs {
        let result = app.deliver_tx(tx.as_bytes());
        if !result.is_ok() {
            warn!("[usdxd] tx rejected at height {}: {}", height, result.log);
        }
        serde_json::to_writer(&mut *out, &result)?;
        writeln!(out)?;
    }
    let end = app.end_block(height)?;
    for event in &end.events {
        info!("[usdxd] end block {}: {}", height, event.kind);
    }
    let commit = app.commit()?;
    info!("[usdxd] block {} committed ({} txs): {}", height, txs.len(), commit);
    Ok(())
}

fn main() -> Result<()> {
    let config = load_config()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level()?)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let export = std::env::args().nth(1).as_deref() == Some("export");
    let chain_id = config.chain_id.clone();
    let genesis = std::fs::read(&config.genesis_path)
        .with_context(|| format!("reading genesis file {}", config.genesis_path.display()))?;

    let mut app = UsdxApp::new(config, Arc::new(InMemoryVersionedDb::new()))
        .context("wiring application")?;
    let init = app.init_chain(&chain_id, &genesis).context("initializing chain")?;
    info!("[usdxd] chain {} initialized: {}", chain_id, init.app_hash);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut pending = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            if !pending.is_empty() {
                run_block(&mut app, &chain_id, &pending, &mut stdout)?;
                pending.clear();
            }
        } else {
            pending.push(line);
        }
    }
    if !pending.is_empty() {
        run_block(&mut app, &chain_id, &pending, &mut stdout)?;
    }

    if export {
        let state = app.export_genesis().context("exporting state")?;
        stdout.write_all(&state.to_json()?)?;
        writeln!(stdout)?;
    }
    Ok(())
}
