//! `nestd` — the Nest deduplicated storage daemon.
//!
//! Binary entrypoint wiring the upload pipeline, tenant container, and
//! metadata repository into a running HTTP service.
//!
//! # Usage
//!
//! ```text
//! nestd start                          # start with defaults (~/.nest)
//! nestd start -c nest.toml             # start with a config file
//! nestd start -d ./data -l 127.0.0.1:4860
//! nestd start --shared                 # one global chunk dir, global dedup
//! nestd start --memory                 # no disk persistence
//! nestd status                         # manifest count from the metadata store
//! ```

mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nest_engine::{Reconstructor, StoreBackend, UploadPipeline};
use nest_meta::{FjallManifestRepository, ManifestRepository, MemoryManifestRepository};
use nest_tenant::{
    DiskUsageProvider, IsolationMode, NoopPermissions, OwnerOnlyPermissions, PermissionSetter,
    QuotaTracker, TenantContainer, WalkDiskUsage,
};
use tracing::{info, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "nestd", version, about = "Nest deduplicated storage daemon")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon.
    Start {
        /// Override the storage base directory.
        #[arg(short = 'd', long)]
        base_dir: Option<PathBuf>,

        /// Override the HTTP listen address (e.g. "127.0.0.1:4860").
        #[arg(short = 'l', long)]
        listen_addr: Option<String>,

        /// Per-tenant quota in bytes.
        #[arg(long, env = "NEST_QUOTA_BYTES")]
        quota_bytes: Option<u64>,

        /// Disable tenant isolation: all tenants share one chunk
        /// directory and deduplication becomes global.
        #[arg(long)]
        shared: bool,

        /// Run fully in-memory (no disk persistence).
        #[arg(short, long)]
        memory: bool,
    },

    /// Show storage status from the local metadata store.
    Status,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Start {
            base_dir,
            listen_addr,
            quota_bytes,
            shared,
            memory,
        } => {
            // CLI args override config file values.
            if let Some(dir) = base_dir {
                config.storage.base_dir = dir;
            }
            if let Some(addr) = listen_addr {
                config.http.listen_addr = addr;
            }
            if let Some(quota) = quota_bytes {
                config.storage.quota_bytes = Some(quota);
            }
            if shared {
                config.storage.isolation = "shared".to_string();
            }
            if memory {
                config.storage.backend = "memory".to_string();
            }
            cmd_start(config).await
        }
        Commands::Status => cmd_status(&config),
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// -----------------------------------------------------------------------
// nestd start
// -----------------------------------------------------------------------

async fn cmd_start(config: CliConfig) -> Result<()> {
    info!("starting nestd");
    info!(
        base_dir = %config.storage.base_dir.display(),
        listen_addr = %config.http.listen_addr,
        backend = %config.storage.backend,
        isolation = %config.storage.isolation,
        quota_bytes = config.storage.quota_bytes,
        "daemon configuration"
    );

    let memory_mode = config.memory_backend();
    let mode = config.isolation_mode();

    // --- Tenant container ---
    let permissions: Box<dyn PermissionSetter> = match mode {
        IsolationMode::Isolated => Box::new(OwnerOnlyPermissions),
        IsolationMode::Shared => Box::new(NoopPermissions),
    };
    let container = Arc::new(TenantContainer::new(
        config.storage.base_dir.clone(),
        mode,
        permissions,
    ));

    // --- Metadata repository ---
    let repo: Arc<dyn ManifestRepository> = if memory_mode {
        info!("using in-memory manifest repository");
        Arc::new(MemoryManifestRepository::new())
    } else {
        std::fs::create_dir_all(&config.storage.base_dir)
            .context("failed to create base directory")?;
        let meta_path = config.storage.base_dir.join("meta");
        Arc::new(
            FjallManifestRepository::open(&meta_path)
                .context("failed to open manifest repository")?,
        )
    };

    // --- Chunk store backend ---
    let backend = if memory_mode {
        info!("using in-memory chunk store");
        StoreBackend::memory()
    } else {
        StoreBackend::File
    };

    // --- Pipeline ---
    let mut pipeline = UploadPipeline::new(container.clone(), repo.clone(), backend.clone());
    if let Some(limit) = config.storage.quota_bytes {
        let quota = Arc::new(QuotaTracker::new(limit));
        if !memory_mode {
            preload_quota(&quota, &config.storage.base_dir)?;
        }
        pipeline = pipeline.with_quota(quota);
    }
    let reconstructor = Reconstructor::new(container, backend);

    // --- HTTP API ---
    let state = server::AppState::new(Arc::new(pipeline), Arc::new(reconstructor), repo.clone());
    let router = server::build_router(state, config.http.max_upload_bytes);

    server::serve_with_shutdown(router, &config.http.listen_addr, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The repository flushes on drop; bound it so a wedged disk cannot
    // hang shutdown forever.
    info!("flushing metadata store");
    let flush = tokio::task::spawn_blocking(move || drop(repo));
    if tokio::time::timeout(Duration::from_secs(10), flush)
        .await
        .is_err()
    {
        warn!("metadata store flush timed out");
    }

    info!("nestd stopped");
    Ok(())
}

/// Completes when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(%e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

/// Seed per-tenant quota counters from existing on-disk data so restarts
/// account for what tenants already stored.
fn preload_quota(quota: &QuotaTracker, base_dir: &std::path::Path) -> Result<()> {
    if !base_dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(base_dir)? {
        let entry = entry?;
        let name = entry.file_name().into_string().unwrap_or_default();
        if let Some(tenant) = name.strip_prefix("tenant_") {
            let used = quota.preload(tenant, &entry.path(), &WalkDiskUsage)?;
            info!(tenant, used, "preloaded tenant quota");
        }
    }
    Ok(())
}

/// Number of `tenant_*` directories under the storage base.
fn count_tenant_dirs(base_dir: &std::path::Path) -> Result<usize> {
    if !base_dir.exists() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in std::fs::read_dir(base_dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with("tenant_") && entry.path().is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

// -----------------------------------------------------------------------
// nestd status
// -----------------------------------------------------------------------

fn cmd_status(config: &CliConfig) -> Result<()> {
    let meta_path = config.storage.base_dir.join("meta");

    let repo = FjallManifestRepository::open(&meta_path).map_err(|e| {
        anyhow::anyhow!(
            "cannot open metadata at {}. Has the daemon run here? ({e})",
            meta_path.display(),
        )
    })?;

    let manifests = repo.manifest_count()?;
    println!("Manifests: {manifests}");

    let tenants = count_tenant_dirs(&config.storage.base_dir)?;
    println!("Tenants:   {tenants}");

    let usage = WalkDiskUsage.usage_bytes(&config.storage.base_dir)?;
    println!(
        "Storage:   {:.1} MB in {}",
        usage as f64 / 1_048_576.0,
        config.storage.base_dir.display()
    );

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
