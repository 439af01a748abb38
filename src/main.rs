use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evotrack::config::Config;
use evotrack::db::{create_pool, init_db, queries, AppState};
use evotrack::handlers;
use evotrack::models::{CreateDepartment, CreateMembership, CreateOrganization, CreateUser, Role};

#[derive(Parser, Debug)]
#[command(name = "evotrack")]
#[command(about = "Multi-tenant time tracking backend")]
struct Cli {
    /// Seed the database with dev data (org, departments, mixed-role members)
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with dev data for testing.
/// Creates an organization with two departments and one member per role.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let org = queries::create_organization(
        &conn,
        &CreateOrganization {
            name: "Dev Org".to_string(),
        },
    )
    .expect("Failed to create dev organization");
    tracing::info!("Organization: {} (id: {})", org.name, org.id);

    let engineering = queries::create_department(
        &conn,
        &org.id,
        &CreateDepartment {
            name: "Engineering".to_string(),
        },
    )
    .expect("Failed to create dev department");
    queries::create_department(
        &conn,
        &org.id,
        &CreateDepartment {
            name: "Finance".to_string(),
        },
    )
    .expect("Failed to create dev department");

    let members = [
        ("owner@devorg.local", "Dev Owner", Role::Owner),
        ("admin@devorg.local", "Dev Admin", Role::Admin),
        ("manager@devorg.local", "Dev Manager", Role::Manager),
        ("employee@devorg.local", "Dev Employee", Role::Employee),
    ];

    for (email, name, role) in members {
        let (user, api_key) = queries::create_user(
            &conn,
            &CreateUser {
                email: email.to_string(),
                name: name.to_string(),
            },
        )
        .expect("Failed to create dev user");

        queries::create_membership(
            &conn,
            &org.id,
            &CreateMembership {
                user_id: user.id.clone(),
                role,
                department_id: Some(engineering.id.clone()),
            },
        )
        .expect("Failed to create dev membership");

        tracing::info!("Member: {} ({})", user.email, role);
        tracing::info!("API Key: {}", api_key);
    }

    tracing::info!("============================================");
    tracing::info!("SAVE THESE API KEYS - THEY WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evotrack=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = pool.get().expect("Failed to get db connection");
        init_db(&conn).expect("Failed to initialize schema");
    }

    let state = AppState { db: pool };

    if cli.seed {
        if !config.dev_mode {
            tracing::error!("--seed is only available in dev mode (EVOTRACK_ENV=dev)");
            std::process::exit(1);
        }
        seed_dev_data(&state);
    }

    let app = handlers::app(state).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
