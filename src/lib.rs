pub mod auth;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod report;
pub mod schema;
pub mod store;

use actix_cors::Cors;
use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use auth::AuthSettings;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::orders::list_orders,
        handlers::orders::report_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::orders::replace_order,
        handlers::orders::delete_order,
    ),
    components(schemas(
        models::order::Order,
        models::order::OrderItem,
        models::order::OrderStatus,
        models::order::OrderPayload,
    )),
    tags(
        (name = "orders", description = "Fire extinguisher service orders"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    auth: AuthSettings,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(auth.clone()))
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/orders")
                    .wrap(from_fn(auth::basic_auth_guard))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("", web::post().to(handlers::orders::create_order))
                    // Registered before `/{id}` so "reports" is not read as an id.
                    .route("/reports", web::get().to(handlers::orders::report_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}", web::put().to(handlers::orders::replace_order))
                    .route("/{id}", web::delete().to(handlers::orders::delete_order)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
