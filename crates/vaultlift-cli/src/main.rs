//! Vaultlift CLI: move vault attachments to S3-compatible storage and clean
//! up remote objects no note references any more.
//!
//! Settings come from VAULTLIFT_* variables (or a .env file); see
//! `UploadSettings::from_env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vaultlift_cli::{init_tracing, AutoConfirm, BarProgress, PromptConfirm};
use vaultlift_core::{CleanupState, UploadSettings};
use vaultlift_services::{
    create_storage, CleanupService, Confirm, DocumentStore, FsVault, RemoteStore, UploadService,
};

#[derive(Parser)]
#[command(name = "vaultlift", about = "Vault attachment offloading to S3")]
struct Cli {
    /// Vault root directory
    #[arg(long, env = "VAULTLIFT_VAULT", default_value = ".", global = true)]
    vault: PathBuf,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every attachment in the vault and rewrite all notes
    UploadAll,
    /// Upload the attachments referenced by one note
    UploadCurrent {
        /// Note path, relative to the vault root
        #[arg(long)]
        file: String,
    },
    /// Remove remote objects no note references
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Only list unused objects
        #[arg(long, conflicts_with = "yes")]
        dry_run: bool,
    },
    /// Verify credentials and bucket access
    CheckConnection,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

async fn open_vault(root: &Path, active: Option<&str>) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let mut vault = FsVault::open(root)
        .await
        .with_context(|| format!("Failed to open vault at {}", root.display()))?;
    if let Some(active) = active {
        vault = vault
            .with_active_file(active)
            .with_context(|| format!("Invalid note path {}", active))?;
    }
    Ok(Arc::new(vault))
}

fn connect(settings: &UploadSettings) -> anyhow::Result<Arc<dyn RemoteStore>> {
    create_storage(settings).context("Cannot create the remote store client")
}

/// Cancel `token` on Ctrl-C; cleanup stops before its next object.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current object");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = UploadSettings::from_env().context("Failed to load VAULTLIFT_* settings")?;

    match cli.command {
        Commands::CheckConnection => {
            let storage = connect(&settings)?;
            storage
                .head_bucket()
                .await
                .with_context(|| format!("Cannot reach bucket {}", storage.bucket()))?;
            print_json(&serde_json::json!({
                "success": true,
                "bucket": storage.bucket(),
                "base_url": settings.public_base_url(),
            }))?;
        }
        Commands::UploadAll => {
            let vault = open_vault(&cli.vault, None).await?;
            let uploader = UploadService::new(vault, connect(&settings)?, settings);
            let summary = uploader.upload_all_attachments(&BarProgress::new()).await?;
            print_json(&summary)?;
            if summary.failed > 0 {
                anyhow::bail!("{} attachment(s) could not be uploaded", summary.failed);
            }
        }
        Commands::UploadCurrent { file } => {
            let vault = open_vault(&cli.vault, Some(&file)).await?;
            let uploader = UploadService::new(vault, connect(&settings)?, settings);
            let summary = uploader
                .upload_current_file_attachments(&BarProgress::new())
                .await?;
            print_json(&summary)?;
            if summary.failed > 0 {
                anyhow::bail!("{} attachment(s) could not be uploaded", summary.failed);
            }
        }
        Commands::Cleanup { yes, dry_run } => {
            let vault = open_vault(&cli.vault, None).await?;
            let move_to_trash = settings.move_to_trash;
            let cleanup = CleanupService::new(vault, connect(&settings)?, settings);

            if dry_run {
                let plan = cleanup.scan().await?;
                print_json(&serde_json::json!({
                    "inventory": plan.inventory.len(),
                    "referenced": plan.referenced.len(),
                    "unused": plan.unused,
                }))?;
                return Ok(());
            }

            let cancel = CancellationToken::new();
            cancel_on_interrupt(cancel.clone());

            let confirm: Box<dyn Confirm> = if yes {
                Box::new(AutoConfirm)
            } else {
                Box::new(PromptConfirm::new(move_to_trash))
            };
            let report = cleanup
                .run(confirm.as_ref(), &cancel, &BarProgress::new())
                .await;
            print_json(&report)?;

            if report.state == CleanupState::Errored {
                anyhow::bail!(
                    "Cleanup failed: {}",
                    report.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    Ok(())
}
