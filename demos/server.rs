//! Example server: synchronizes a few tables at startup, then serves health routes and
//! paginated listing under /api/v1/tables/:table/page.
//!
//! `DB_DRIVER=sqlite DB_DSN=demo.db cargo run --example server`

use axum::Router;
use tablesync::config::load_from_path;
use tablesync::{
    bootstrap, common_routes_with_ready, table_routes, AppState, DbConfig, Entity, FieldDef, TableDescriptor,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

struct User;

impl Entity for User {
    const TABLE: &'static str = "users";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::integer("Id"),
            FieldDef::string("Name"),
            FieldDef::string("Mobile").tag("length:20 index:mobile,unique"),
            FieldDef::string("Password").tag("length:64"),
            FieldDef::timestamp("Ctime"),
        ]
    }
}

struct Room;

impl Entity for Room {
    const TABLE: &'static str = "room";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::integer("Id"),
            FieldDef::integer("Uid").tag("index:uid"),
            FieldDef::string("RoomName"),
            FieldDef::blob("Config"),
            FieldDef::timestamp("Ctime"),
        ]
    }
}

struct Conference;

impl Entity for Conference {
    const TABLE: &'static str = "conference";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::integer("Id"),
            FieldDef::integer("RoomId").tag("index:room_ctime"),
            FieldDef::string("RoomName"),
            FieldDef::integer("Uid"),
            FieldDef::timestamp("Ctime").tag("index:room_ctime"),
            FieldDef::timestamp("Etime").optional(),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tablesync=info".parse()?))
        .init();

    // Tables declared in code come first, then any listed in the config file.
    let mut tables: Vec<TableDescriptor> = vec![User::descriptor()?, Room::descriptor()?, Conference::descriptor()?];
    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => {
            let file = load_from_path(path).await?;
            tables.extend(file.descriptors()?);
            file.db
        }
        Err(_) => DbConfig::from_env()?,
    };
    let db = bootstrap(&config, &tables).await?;
    let state = AppState::new(db.clone(), tables);

    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", table_routes(state));

    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    db.close().await;
    tracing::info!("shut down");
    Ok(())
}
