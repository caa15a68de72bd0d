use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::{AppError, AppResult},
    filter::MovieFilter,
    models::{
        ActorView, ActorWrite, CastEntry, GenreView, GenreWrite, LandingPage, MovieDetail,
        MovieEditOptions, MovieFormOptions, MovieSummary, MovieWrite, RatingRequest, VenueView,
        VenueWrite,
    },
    pagination::{PageQuery, Paged},
    storage::{ACTOR_PHOTOS, MOVIE_POSTERS, Upload},
    viewer::Viewer,
};

pub async fn landing(State(state): State<Arc<AppState>>) -> AppResult<Json<LandingPage>> {
    Ok(Json(state.catalog.landing().await?))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Viewer(viewer): Viewer,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.movie_view(id, viewer.as_deref()).await?))
}

pub async fn filter_movies(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovieFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Paged<MovieSummary>> {
    state.catalog.filter_movies(&filter, page).await
}

pub async fn movie_form_options(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<MovieFormOptions>> {
    Ok(Json(state.catalog.movie_form_options().await?))
}

pub async fn movie_edit_options(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<MovieEditOptions>> {
    Ok(Json(state.catalog.movie_edit_options(id).await?))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<i32>)> {
    let (write, poster) = read_movie_form(multipart).await?;

    let handle = match poster {
        Some(upload) => Some(state.assets.save(MOVIE_POSTERS, &upload).await?),
        None => None,
    };

    let id = state.catalog.create_movie(write, handle).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    let (write, poster) = read_movie_form(multipart).await?;

    // Replace-in-place: the previous handle tells the store what to drop.
    let handle = match poster {
        Some(upload) => {
            let previous = state.catalog.movie_poster(id).await?;
            Some(state.assets.replace(MOVIE_POSTERS, &upload, previous.as_deref()).await?)
        }
        None => None,
    };

    state.catalog.update_movie(id, write, handle).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    // Row first, asset second: a storage failure leaves an orphaned file,
    // never an undeleted movie.
    let poster = state.catalog.delete_movie(id).await?;
    if let Some(handle) = poster {
        state.assets.delete(&handle).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_genres(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> AppResult<Paged<GenreView>> {
    state.catalog.list_genres(page).await
}

pub async fn all_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<GenreView>>> {
    Ok(Json(state.catalog.all_genres().await?))
}

pub async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<GenreView>> {
    Ok(Json(state.catalog.genre(id).await?))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    Json(write): Json<GenreWrite>,
) -> AppResult<(StatusCode, Json<i32>)> {
    let id = state.catalog.create_genre(write).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn update_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(write): Json<GenreWrite>,
) -> AppResult<StatusCode> {
    state.catalog.update_genre(id, write).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_actors(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> AppResult<Paged<ActorView>> {
    state.catalog.list_actors(page).await
}

pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<ActorView>> {
    Ok(Json(state.catalog.actor(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ActorSearch {
    #[serde(default)]
    name: String,
}

pub async fn search_actors(
    State(state): State<Arc<AppState>>,
    Query(search): Query<ActorSearch>,
) -> AppResult<Json<Vec<ActorView>>> {
    Ok(Json(state.catalog.search_actors(&search.name).await?))
}

pub async fn create_actor(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<i32>)> {
    let (write, photo) = read_actor_form(multipart).await?;

    let handle = match photo {
        Some(upload) => Some(state.assets.save(ACTOR_PHOTOS, &upload).await?),
        None => None,
    };

    let id = state.catalog.create_actor(write, handle).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn update_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    let (write, photo) = read_actor_form(multipart).await?;

    let handle = match photo {
        Some(upload) => {
            let previous = state.catalog.actor_photo(id).await?;
            Some(state.assets.replace(ACTOR_PHOTOS, &upload, previous.as_deref()).await?)
        }
        None => None,
    };

    state.catalog.update_actor(id, write, handle).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let photo = state.catalog.delete_actor(id).await?;
    if let Some(handle) = photo {
        state.assets.delete(&handle).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> AppResult<Paged<VenueView>> {
    state.catalog.list_venues(page).await
}

pub async fn all_venues(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<VenueView>>> {
    Ok(Json(state.catalog.all_venues().await?))
}

pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<VenueView>> {
    Ok(Json(state.catalog.venue(id).await?))
}

pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    Json(write): Json<VenueWrite>,
) -> AppResult<(StatusCode, Json<i32>)> {
    let id = state.catalog.create_venue(write).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(write): Json<VenueWrite>,
) -> AppResult<StatusCode> {
    state.catalog.update_venue(id, write).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.catalog.delete_venue(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_rating(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Json(req): Json<RatingRequest>,
) -> AppResult<StatusCode> {
    let viewer = viewer.require()?;
    state.catalog.submit_rating(&viewer, req.movie_id, req.score).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_movie_form(mut multipart: Multipart) -> AppResult<(MovieWrite, Option<Upload>)> {
    let mut title = String::new();
    let mut synopsis = None;
    let mut release_date = String::new();
    let mut in_theaters = false;
    let mut genre_ids: Vec<i32> = Vec::new();
    let mut venue_ids: Vec<i32> = Vec::new();
    let mut cast: Vec<CastEntry> = Vec::new();
    let mut poster = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = field.text().await?,
            "synopsis" => {
                synopsis = Some(field.text().await?).filter(|s| !s.trim().is_empty());
            }
            "release_date" => release_date = field.text().await?,
            "in_theaters" => in_theaters = parse_bool(&field.text().await?, "in_theaters")?,
            "genre_ids" => genre_ids = parse_json(&field.text().await?, "genre_ids")?,
            "venue_ids" => venue_ids = parse_json(&field.text().await?, "venue_ids")?,
            "cast" => cast = parse_json(&field.text().await?, "cast")?,
            "poster" => poster = Some(read_upload(field).await?),
            _ => {}
        }
    }

    let write =
        MovieWrite { title, synopsis, release_date, in_theaters, genre_ids, venue_ids, cast };
    Ok((write, poster))
}

async fn read_actor_form(mut multipart: Multipart) -> AppResult<(ActorWrite, Option<Upload>)> {
    let mut name = String::new();
    let mut birth_date = String::new();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = field.text().await?,
            "birth_date" => birth_date = field.text().await?,
            "photo" => photo = Some(read_upload(field).await?),
            _ => {}
        }
    }

    Ok((ActorWrite { name, birth_date }, photo))
}

async fn read_upload(field: Field<'_>) -> AppResult<Upload> {
    let ext = field.file_name().and_then(file_ext);
    let bytes = field.bytes().await?.to_vec();
    Ok(Upload { bytes, ext })
}

fn file_ext(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, field: &str) -> AppResult<T> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::validation(format!("{field} is not valid JSON: {err}")))
}

fn parse_bool(raw: &str, field: &str) -> AppResult<bool> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::validation(format!("{field} must be true or false")))
}
