use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use marquee::{
    AppState, catalog::Catalog, config::Config, db, pagination::TOTAL_COUNT_HEADER, routes,
    storage::AssetStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,marquee=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(&config.database_url).await?;
    let catalog = Catalog::new(db, config.max_page_size);
    let assets = AssetStore::new(&config.media_dir);

    let state = Arc::new(AppState { config: config.clone(), catalog, assets });

    let cors = {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([HeaderName::from_static(TOTAL_COUNT_HEADER)]);
        match &config.frontend_url {
            Some(origin) => cors.allow_origin(origin.parse::<HeaderValue>()?),
            None => cors.allow_origin(Any),
        }
    };

    let app = Router::new()
        .route("/api/movies", get(routes::landing).post(routes::create_movie))
        .route("/api/movies/filter", get(routes::filter_movies))
        .route("/api/movies/form-options", get(routes::movie_form_options))
        .route(
            "/api/movies/{id}",
            get(routes::get_movie).put(routes::update_movie).delete(routes::delete_movie),
        )
        .route("/api/movies/{id}/edit-options", get(routes::movie_edit_options))
        .route("/api/genres", get(routes::list_genres).post(routes::create_genre))
        .route("/api/genres/all", get(routes::all_genres))
        .route(
            "/api/genres/{id}",
            get(routes::get_genre).put(routes::update_genre).delete(routes::delete_genre),
        )
        .route("/api/actors", get(routes::list_actors).post(routes::create_actor))
        .route("/api/actors/search", get(routes::search_actors))
        .route(
            "/api/actors/{id}",
            get(routes::get_actor).put(routes::update_actor).delete(routes::delete_actor),
        )
        .route("/api/venues", get(routes::list_venues).post(routes::create_venue))
        .route("/api/venues/all", get(routes::all_venues))
        .route(
            "/api/venues/{id}",
            get(routes::get_venue).put(routes::update_venue).delete(routes::delete_venue),
        )
        .route("/api/ratings", post(routes::submit_rating))
        .nest_service("/media", ServeDir::new(&config.media_dir))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
