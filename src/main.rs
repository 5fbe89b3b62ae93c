use std::{process, sync::Arc};

use newsdesk::{
    application::{
        articles::ArticleService,
        error::AppError,
        publish::{CategoryMap, PublishService},
        rehome::AssetRehomer,
        repos::{ArticlesRepo, AuditRepo, PublishLocks, WritersRepo},
    },
    config,
    infra::{
        content_lake::HttpContentLake,
        db::{PgPublishLocks, PostgresRepositories},
        error::InfraError,
        http::{self, HttpState},
        storage::FsObjectStore,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories.clone(), &settings)?;
    serve_http(&settings, state, repositories).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let articles_repo: Arc<dyn ArticlesRepo> = repositories.clone();
    let writers_repo: Arc<dyn WritersRepo> = repositories.clone();
    let audit_repo: Arc<dyn AuditRepo> = repositories.clone();

    let object_store = Arc::new(
        FsObjectStore::new(
            settings.storage.root.clone(),
            &settings.storage.public_base_url,
        )
        .map_err(|err| AppError::unexpected(format!("object store init failed: {err}")))?,
    );

    let lake = Arc::new(HttpContentLake::new(
        settings.content_lake.base_url.clone(),
        settings.content_lake.dataset.clone(),
        settings.content_lake.token.clone(),
    ));

    let locks: Arc<dyn PublishLocks> =
        Arc::new(PgPublishLocks::new(repositories.pool().clone()));
    let rehomer = AssetRehomer::new(object_store, lake.clone());

    let articles = Arc::new(ArticleService::new(
        articles_repo.clone(),
        audit_repo.clone(),
    ));
    let publish = Arc::new(PublishService::new(
        articles_repo,
        writers_repo,
        audit_repo,
        locks,
        lake,
        rehomer,
        CategoryMap::new(settings.categories.clone()),
    ));

    Ok(HttpState { articles, publish })
}

async fn serve_http(
    settings: &config::Settings,
    state: HttpState,
    repositories: Arc<PostgresRepositories>,
) -> Result<(), AppError> {
    let health_repos = repositories.clone();
    let router = http::build_router(state).route(
        "/healthz",
        axum::routing::get(move || {
            let repos = health_repos.clone();
            async move { http::db_health_response(repos.health_check().await) }
        }),
    );

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "newsdesk::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!(target = "newsdesk::serve", "shutdown signal received");
}
