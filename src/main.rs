use std::{net::SocketAddr, process, sync::Arc};

use folio::{
    application::{content::ContentStore, error::AppError},
    cache::{CacheConfig, CacheSweeper, TtlCache},
    config,
    domain::{
        collections::{CollectionKind, Document},
        language::LanguageCode,
    },
    infra::{
        error::InfraError,
        http::{self, ApiRateLimiter, ApiState},
        snapshots::FsSnapshotRepo,
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Import(args) => run_import(settings, args).await,
    }
}

fn build_store(settings: &config::Settings) -> ContentStore {
    let cache = Arc::new(TtlCache::new(&CacheConfig::from(&settings.cache)));
    let repo = Arc::new(FsSnapshotRepo::new(settings.content.directory.clone()));
    ContentStore::new(repo, cache, settings.content.default_language.clone())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = Arc::new(build_store(&settings));
    let sweeper = CacheSweeper::spawn(
        Arc::clone(store.cache()),
        CacheConfig::from(&settings.cache).sweep_interval(),
    );

    let rate_limiter = Arc::new(ApiRateLimiter::new(
        std::time::Duration::from_secs(u64::from(settings.api_rate_limit.window_seconds.get())),
        settings.api_rate_limit.max_requests.get(),
    ));
    let state = ApiState::new(
        Arc::clone(&store),
        rate_limiter,
        settings.content.languages.clone(),
        settings.environment,
    );
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::serve",
        addr = %settings.server.addr,
        content_dir = %settings.content.directory.display(),
        default_language = %settings.content.default_language,
        environment = ?settings.environment,
        "Listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .into_future(),
    );

    let outcome = tokio::select! {
        joined = &mut server => joined,
        _ = shutdown_signal() => {
            info!(target = "folio::serve", "Shutdown requested, draining connections");
            let _ = stop_tx.send(());
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        target = "folio::serve",
                        timeout_secs = settings.server.graceful_shutdown.as_secs(),
                        "Graceful shutdown timed out; aborting open connections"
                    );
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    sweeper.shutdown().await;

    match outcome {
        Ok(Ok(())) => {
            info!(target = "folio::serve", "Server stopped");
            Ok(())
        }
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "folio::serve",
            error = %err,
            "Failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}

async fn run_import(settings: config::Settings, args: config::ImportArgs) -> Result<(), AppError> {
    let kind: CollectionKind = args.collection.parse()?;
    let language = LanguageCode::parse(&args.language)?;
    let path = args.file;

    info!(
        target = "folio::import",
        path = %path.display(),
        collection = %kind,
        language = %language,
        "Starting import"
    );

    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let docs: Vec<Document> = serde_json::from_str(&raw).map_err(|err| {
        AppError::validation(format!(
            "{} must contain a JSON array of objects: {err}",
            path.display()
        ))
    })?;

    let store = build_store(&settings);
    let written = store.save_documents(kind, docs, &language).await?;

    info!(
        target = "folio::import",
        collection = %kind,
        language = %language,
        records = written,
        "Import completed"
    );
    Ok(())
}
