//! Filedock — file management backend.
//!
//! One binary, three entry points: the background job worker, and two
//! admin commands that exercise the producer side (user registration and
//! file upload).

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use filedock_core::config::AppConfig;
use filedock_core::result::AppResult;
use filedock_core::traits::storage::StorageProvider;
use filedock_database::repositories::{FileRepository, JobRepository, UserRepository};
use filedock_mailer::SmtpMailer;
use filedock_service::broker::JobBroker;
use filedock_service::password::PasswordHasher;
use filedock_service::user::RegisterRequest;
use filedock_service::{FileService, UserService};
use filedock_storage::{LocalStorageProvider, ThumbnailGenerator};
use filedock_worker::jobs::{EmailJobHandler, ThumbnailJobHandler};
use filedock_worker::{JobExecutor, JobQueue, WorkerRunner};

#[derive(Parser)]
#[command(name = "filedock", version, about = "Filedock file management backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the background job worker.
    Worker,
    /// Register a user account (enqueues the welcome email).
    CreateUser {
        /// Email address for the new account.
        #[arg(long)]
        email: String,
        /// Plaintext password for the new account.
        #[arg(long)]
        password: String,
    },
    /// Upload a file for a user (enqueues thumbnail generation for images).
    Upload {
        /// Owning user ID.
        #[arg(long)]
        owner: Uuid,
        /// Path to the local file to upload.
        #[arg(long)]
        path: PathBuf,
        /// MIME type override; guessed from the extension when omitted.
        #[arg(long)]
        mime_type: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env = std::env::var("FILEDOCK_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = match cli.command {
        Command::Worker => run_worker(config).await,
        Command::CreateUser { email, password } => create_user(config, email, password).await,
        Command::Upload {
            owner,
            path,
            mime_type,
        } => upload(config, owner, path, mime_type).await,
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Shared wiring: database, storage, repositories, and the job queue.
struct Context {
    storage: Arc<dyn StorageProvider>,
    user_repo: Arc<UserRepository>,
    file_repo: Arc<FileRepository>,
    queue: Arc<JobQueue>,
}

impl Context {
    async fn build(config: &AppConfig) -> AppResult<Self> {
        let pool = filedock_database::connection::create_pool(&config.database).await?;
        filedock_database::migration::run_migrations(&pool).await?;

        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(&config.storage.root_path).await?);

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let file_repo = Arc::new(FileRepository::new(pool.clone()));
        let job_repo = Arc::new(JobRepository::new(pool));

        let worker_id = format!("worker-{}", Uuid::new_v4());
        let queue = Arc::new(JobQueue::new(job_repo, worker_id, &config.worker));

        Ok(Self {
            storage,
            user_repo,
            file_repo,
            queue,
        })
    }
}

/// Run the job worker until interrupted.
async fn run_worker(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting Filedock worker v{}", env!("CARGO_PKG_VERSION"));

    if !config.worker.enabled {
        tracing::warn!("Worker is disabled in configuration; exiting");
        return Ok(());
    }

    let ctx = Context::build(&config).await?;

    let mailer = Arc::new(SmtpMailer::new(&config.mailer)?);
    let generator = Arc::new(ThumbnailGenerator::new(Arc::clone(&ctx.storage)));

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(ThumbnailJobHandler::new(
        Arc::clone(&ctx.file_repo) as _,
        generator as _,
        config.storage.thumbnail_widths.clone(),
    )));
    executor.register(Arc::new(EmailJobHandler::new(
        Arc::clone(&ctx.user_repo) as _,
        mailer as _,
    )));

    let worker_id = format!("worker-{}", Uuid::new_v4());
    let runner = WorkerRunner::new(
        Arc::clone(&ctx.queue),
        Arc::new(executor),
        config.worker.clone(),
        worker_id,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    runner.run(shutdown_rx).await;
    Ok(())
}

/// Register a user; the welcome email is delivered by the worker.
async fn create_user(config: AppConfig, email: String, password: String) -> AppResult<()> {
    let ctx = Context::build(&config).await?;

    let service = UserService::new(
        Arc::clone(&ctx.user_repo),
        Arc::new(PasswordHasher::new()),
        Arc::clone(&ctx.queue) as Arc<dyn JobBroker>,
    );

    let user = service.register(RegisterRequest { email, password }).await?;
    println!("Created user {} <{}>", user.id, user.email);
    Ok(())
}

/// Upload a file; thumbnails are generated by the worker for images.
async fn upload(
    config: AppConfig,
    owner: Uuid,
    path: PathBuf,
    mime_type: Option<String>,
) -> AppResult<()> {
    let ctx = Context::build(&config).await?;

    let service = FileService::new(
        Arc::clone(&ctx.file_repo),
        Arc::clone(&ctx.storage),
        Arc::clone(&ctx.queue) as Arc<dyn JobBroker>,
    );

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = mime_type.or_else(|| guess_mime(&path));
    let data = bytes::Bytes::from(tokio::fs::read(&path).await?);

    let file = service
        .upload(filedock_service::file::UploadRequest {
            owner_id: owner,
            name,
            mime_type,
            data,
        })
        .await?;

    println!("Uploaded file {} at {}", file.id, file.local_path);
    Ok(())
}

/// Guess a MIME type from a file extension.
fn guess_mime(path: &std::path::Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}
