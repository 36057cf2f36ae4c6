use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use approval_flow::models::user::UserRole;
use approval_flow::services::requests::RequestService;
use approval_flow::services::users::UserService;
use approval_flow::store::postgres::PgStore;
use approval_flow::store::Store;
use approval_flow::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "approval_flow=debug,approvald=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::User { command }) => {
            let users = UserService::new(connect(&cfg).await?);
            handle_user_command(&users, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    }
}

async fn connect(cfg: &config::Config) -> anyhow::Result<Arc<dyn Store>> {
    let db = PgStore::connect(&cfg.database_url).await?;
    Ok(Arc::new(db))
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let store: Arc<dyn Store> = Arc::new(db);
    let state = Arc::new(AppState {
        requests: RequestService::new(store.clone()),
        users: UserService::new(store),
        config: cfg,
    });

    let app = axum::Router::new()
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .merge(api::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // The dashboard is served from another origin in development; the
        // API itself carries no cookies, so a permissive policy is enough.
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("approval-flow listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_user_command(
    users: &UserService,
    cmd: cli::UserCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::UserCommands::Create {
            username,
            password,
            role,
        } => {
            let role = match role.as_str() {
                "requester" => UserRole::Requester,
                "approver" => UserRole::Approver,
                other => anyhow::bail!(
                    "invalid role: {}. Must be 'requester' or 'approver'",
                    other
                ),
            };

            let user = users.create(&username, &password, role).await?;
            println!(
                "User created:\n  ID:       {}\n  Username: {}\n  Role:     {:?}",
                user.id, user.username, user.role
            );
        }
        cli::UserCommands::Approvers => {
            let approvers = users.approvers().await?;
            if approvers.is_empty() {
                println!("No approvers found.");
            } else {
                println!("{:<38} USERNAME", "ID");
                for a in approvers {
                    println!("{:<38} {}", a.id, a.username);
                }
            }
        }
    }
    Ok(())
}
