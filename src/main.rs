use anyhow::Result;
use axum::Router;
use canteen_orderservice::{app_state::AppState, config, db, routes};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::init_pool(&config.database.url).await?;
    let state = AppState { db_pool };

    let routes = routes::students::orders::routes_with_openapi()
        .merge(routes::students::foods::routes_with_openapi())
        .merge(routes::managers::orders::routes_with_openapi())
        .merge(routes::agents::orders::routes_with_openapi());

    let (router, mut openapi) = routes.split_for_parts();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Canteen OrderService API")
        .version("1.0.0")
        .build();
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    let app = Router::new()
        .merge(router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    tracing::info!("CanteenOrderService listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
