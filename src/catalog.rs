use std::collections::HashSet;

use jiff::civil::Date;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::OnConflict,
};
use tracing::debug;

use crate::{
    entities::{actor, genre, movie, movie_actor, movie_genre, movie_venue, rating, venue},
    error::{AppError, AppResult},
    filter::MovieFilter,
    models::{
        ActorView, ActorWrite, CastView, GenreView, GenreWrite, LandingPage, MovieDetail,
        MovieEditOptions, MovieFormOptions, MovieSummary, MovieWrite, VenueView, VenueWrite,
    },
    pagination::{PageQuery, Paged, paginate},
};

pub const LANDING_LIST_LEN: u64 = 6;
pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

const ACTOR_SEARCH_LIMIT: u64 = 10;

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl Catalog {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn clamp(&self, page: PageQuery) -> PageQuery {
        page.clamped(self.max_page_size)
    }

    pub async fn landing(&self) -> AppResult<LandingPage> {
        let today = today().to_string();

        let upcoming = movie::Entity::find()
            .filter(movie::Column::ReleaseDate.gt(today))
            .order_by_asc(movie::Column::ReleaseDate)
            .limit(LANDING_LIST_LEN)
            .all(&self.db)
            .await?;

        let now_showing = movie::Entity::find()
            .filter(movie::Column::InTheaters.eq(true))
            .order_by_asc(movie::Column::ReleaseDate)
            .limit(LANDING_LIST_LEN)
            .all(&self.db)
            .await?;

        Ok(LandingPage {
            upcoming: upcoming.into_iter().map(Into::into).collect(),
            now_showing: now_showing.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn movie_view(&self, id: i32, viewer: Option<&str>) -> AppResult<MovieDetail> {
        let Some(movie) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("movie"));
        };

        let genres = movie_genre::Entity::find()
            .filter(movie_genre::Column::MovieId.eq(id))
            .find_also_related(genre::Entity)
            .all(&self.db)
            .await?;

        let mut cast_rows = movie_actor::Entity::find()
            .filter(movie_actor::Column::MovieId.eq(id))
            .find_also_related(actor::Entity)
            .all(&self.db)
            .await?;

        let venues = movie_venue::Entity::find()
            .filter(movie_venue::Column::MovieId.eq(id))
            .find_also_related(venue::Entity)
            .all(&self.db)
            .await?;

        // Billing order decides display order, not storage order.
        cast_rows.sort_by_key(|(link, _)| link.billing_order);

        let (average_score, viewer_score) = self.ratings_for(id, viewer).await?;

        Ok(MovieDetail {
            id: movie.id,
            title: movie.title,
            synopsis: movie.synopsis,
            release_date: movie.release_date,
            in_theaters: movie.in_theaters,
            poster: movie.poster,
            average_score,
            viewer_score,
            genres: genres.into_iter().filter_map(|(_, g)| g).map(Into::into).collect(),
            cast: cast_rows
                .into_iter()
                .filter_map(|(link, a)| {
                    a.map(|a| CastView {
                        actor_id: a.id,
                        name: a.name,
                        character: link.character,
                        billing_order: link.billing_order,
                        photo: a.photo,
                    })
                })
                .collect(),
            venues: venues.into_iter().filter_map(|(_, v)| v).map(Into::into).collect(),
        })
    }

    pub async fn filter_movies(
        &self,
        filter: &MovieFilter,
        page: PageQuery,
    ) -> AppResult<Paged<MovieSummary>> {
        let page = self.clamp(page);
        let select = movie::Entity::find()
            .filter(filter.conditions(today()))
            .order_by_asc(movie::Column::Title);
        Ok(paginate(&self.db, select, &page).await?.map(MovieSummary::from))
    }

    pub async fn movie_form_options(&self) -> AppResult<MovieFormOptions> {
        Ok(MovieFormOptions { genres: self.all_genres().await?, venues: self.all_venues().await? })
    }

    pub async fn movie_edit_options(&self, id: i32) -> AppResult<MovieEditOptions> {
        let movie = self.movie_view(id, None).await?;

        let selected_genres: Vec<i32> = movie.genres.iter().map(|g| g.id).collect();
        let unselected_genres = genre::Entity::find()
            .filter(genre::Column::Id.is_not_in(selected_genres))
            .order_by_asc(genre::Column::Name)
            .all(&self.db)
            .await?;

        let selected_venues: Vec<i32> = movie.venues.iter().map(|v| v.id).collect();
        let unselected_venues = venue::Entity::find()
            .filter(venue::Column::Id.is_not_in(selected_venues))
            .order_by_asc(venue::Column::Name)
            .all(&self.db)
            .await?;

        Ok(MovieEditOptions {
            movie,
            unselected_genres: unselected_genres.into_iter().map(Into::into).collect(),
            unselected_venues: unselected_venues.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn movie_poster(&self, id: i32) -> AppResult<Option<String>> {
        let Some(movie) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("movie"));
        };
        Ok(movie.poster)
    }

    pub async fn create_movie(&self, write: MovieWrite, poster: Option<String>) -> AppResult<i32> {
        let write = validated_movie(write)?;

        let txn = self.db.begin().await?;

        let movie_id = movie::Entity::insert(movie::ActiveModel {
            id: Default::default(),
            title: Set(write.title.clone()),
            synopsis: Set(write.synopsis.clone()),
            release_date: Set(write.release_date.clone()),
            in_theaters: Set(write.in_theaters),
            poster: Set(poster),
        })
        .exec(&txn)
        .await?
        .last_insert_id;

        insert_links(&txn, movie_id, &write).await?;

        txn.commit().await?;

        debug!(movie_id = movie_id, "created movie");
        Ok(movie_id)
    }

    pub async fn update_movie(
        &self,
        id: i32,
        write: MovieWrite,
        poster: Option<String>,
    ) -> AppResult<()> {
        let write = validated_movie(write)?;

        let txn = self.db.begin().await?;

        let Some(existing) = movie::Entity::find_by_id(id).one(&txn).await? else {
            return Err(AppError::NotFound("movie"));
        };

        let mut model: movie::ActiveModel = existing.into();
        model.title = Set(write.title.clone());
        model.synopsis = Set(write.synopsis.clone());
        model.release_date = Set(write.release_date.clone());
        model.in_theaters = Set(write.in_theaters);
        if let Some(handle) = poster {
            model.poster = Set(Some(handle));
        }
        movie::Entity::update(model).exec(&txn).await?;

        // The submitted lists replace the stored association sets wholesale.
        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        movie_actor::Entity::delete_many()
            .filter(movie_actor::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        movie_venue::Entity::delete_many()
            .filter(movie_venue::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;

        insert_links(&txn, id, &write).await?;

        txn.commit().await?;

        debug!(movie_id = id, "updated movie");
        Ok(())
    }

    // Returns the poster handle so the caller can drop the stored asset after
    // the row deletion has committed.
    pub async fn delete_movie(&self, id: i32) -> AppResult<Option<String>> {
        let Some(movie) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("movie"));
        };
        let poster = movie.poster.clone();
        movie::Entity::delete_by_id(id).exec(&self.db).await?;
        debug!(movie_id = id, "deleted movie");
        Ok(poster)
    }

    pub async fn ratings_for(&self, movie_id: i32, viewer: Option<&str>) -> AppResult<(f64, i32)> {
        let rows = rating::Entity::find()
            .filter(rating::Column::MovieId.eq(movie_id))
            .all(&self.db)
            .await?;

        if rows.is_empty() {
            return Ok((0.0, 0));
        }

        let average = rows.iter().map(|r| r.score as f64).sum::<f64>() / rows.len() as f64;
        let viewer_score = viewer
            .and_then(|v| rows.iter().find(|r| r.viewer_id == v))
            .map(|r| r.score)
            .unwrap_or(0);

        Ok((average, viewer_score))
    }

    pub async fn submit_rating(&self, viewer: &str, movie_id: i32, score: i32) -> AppResult<()> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(AppError::validation(format!(
                "score must be between {MIN_SCORE} and {MAX_SCORE}"
            )));
        }

        if movie::Entity::find_by_id(movie_id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("movie"));
        }

        // One rating per (movie, viewer); a resubmission overwrites the score.
        rating::Entity::insert(rating::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie_id),
            viewer_id: Set(viewer.to_string()),
            score: Set(score),
        })
        .on_conflict(
            OnConflict::columns([rating::Column::MovieId, rating::Column::ViewerId])
                .update_columns([rating::Column::Score])
                .to_owned(),
        )
        .exec(&self.db)
        .await?;

        debug!(movie_id = movie_id, score = score, "rating submitted");
        Ok(())
    }

    pub async fn list_genres(&self, page: PageQuery) -> AppResult<Paged<GenreView>> {
        let page = self.clamp(page);
        let select = genre::Entity::find().order_by_asc(genre::Column::Name);
        Ok(paginate(&self.db, select, &page).await?.map(GenreView::from))
    }

    pub async fn all_genres(&self) -> AppResult<Vec<GenreView>> {
        let genres =
            genre::Entity::find().order_by_asc(genre::Column::Name).all(&self.db).await?;
        Ok(genres.into_iter().map(Into::into).collect())
    }

    pub async fn genre(&self, id: i32) -> AppResult<GenreView> {
        let Some(genre) = genre::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("genre"));
        };
        Ok(genre.into())
    }

    pub async fn create_genre(&self, write: GenreWrite) -> AppResult<i32> {
        let name = validated_genre_name(&write.name)?;
        let id = genre::Entity::insert(genre::ActiveModel {
            id: Default::default(),
            name: Set(name),
        })
        .exec(&self.db)
        .await?
        .last_insert_id;
        Ok(id)
    }

    pub async fn update_genre(&self, id: i32, write: GenreWrite) -> AppResult<()> {
        let name = validated_genre_name(&write.name)?;
        let Some(existing) = genre::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("genre"));
        };
        let mut model: genre::ActiveModel = existing.into();
        model.name = Set(name);
        genre::Entity::update(model).exec(&self.db).await?;
        Ok(())
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        if genre::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("genre"));
        }
        // Link rows go with the genre; movies stay.
        genre::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn list_actors(&self, page: PageQuery) -> AppResult<Paged<ActorView>> {
        let page = self.clamp(page);
        let select = actor::Entity::find().order_by_asc(actor::Column::Name);
        Ok(paginate(&self.db, select, &page).await?.map(ActorView::from))
    }

    pub async fn actor(&self, id: i32) -> AppResult<ActorView> {
        let Some(actor) = actor::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("actor"));
        };
        Ok(actor.into())
    }

    pub async fn search_actors(&self, name: &str) -> AppResult<Vec<ActorView>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }
        let actors = actor::Entity::find()
            .filter(actor::Column::Name.contains(name))
            .order_by_asc(actor::Column::Name)
            .limit(ACTOR_SEARCH_LIMIT)
            .all(&self.db)
            .await?;
        Ok(actors.into_iter().map(Into::into).collect())
    }

    pub async fn create_actor(&self, write: ActorWrite, photo: Option<String>) -> AppResult<i32> {
        let write = validated_actor(write)?;
        let id = actor::Entity::insert(actor::ActiveModel {
            id: Default::default(),
            name: Set(write.name),
            birth_date: Set(write.birth_date),
            photo: Set(photo),
        })
        .exec(&self.db)
        .await?
        .last_insert_id;
        Ok(id)
    }

    pub async fn update_actor(
        &self,
        id: i32,
        write: ActorWrite,
        photo: Option<String>,
    ) -> AppResult<()> {
        let write = validated_actor(write)?;
        let Some(existing) = actor::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("actor"));
        };
        let mut model: actor::ActiveModel = existing.into();
        model.name = Set(write.name);
        model.birth_date = Set(write.birth_date);
        if let Some(handle) = photo {
            model.photo = Set(Some(handle));
        }
        actor::Entity::update(model).exec(&self.db).await?;
        Ok(())
    }

    pub async fn actor_photo(&self, id: i32) -> AppResult<Option<String>> {
        let Some(actor) = actor::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("actor"));
        };
        Ok(actor.photo)
    }

    pub async fn delete_actor(&self, id: i32) -> AppResult<Option<String>> {
        let Some(actor) = actor::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("actor"));
        };
        let photo = actor.photo.clone();
        actor::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(photo)
    }

    pub async fn list_venues(&self, page: PageQuery) -> AppResult<Paged<VenueView>> {
        let page = self.clamp(page);
        let select = venue::Entity::find().order_by_asc(venue::Column::Name);
        Ok(paginate(&self.db, select, &page).await?.map(VenueView::from))
    }

    pub async fn all_venues(&self) -> AppResult<Vec<VenueView>> {
        let venues =
            venue::Entity::find().order_by_asc(venue::Column::Name).all(&self.db).await?;
        Ok(venues.into_iter().map(Into::into).collect())
    }

    pub async fn venue(&self, id: i32) -> AppResult<VenueView> {
        let Some(venue) = venue::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("venue"));
        };
        Ok(venue.into())
    }

    pub async fn create_venue(&self, write: VenueWrite) -> AppResult<i32> {
        let write = validated_venue(write)?;
        let id = venue::Entity::insert(venue::ActiveModel {
            id: Default::default(),
            name: Set(write.name),
            latitude: Set(write.latitude),
            longitude: Set(write.longitude),
        })
        .exec(&self.db)
        .await?
        .last_insert_id;
        Ok(id)
    }

    pub async fn update_venue(&self, id: i32, write: VenueWrite) -> AppResult<()> {
        let write = validated_venue(write)?;
        let Some(existing) = venue::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("venue"));
        };
        let mut model: venue::ActiveModel = existing.into();
        model.name = Set(write.name);
        model.latitude = Set(write.latitude);
        model.longitude = Set(write.longitude);
        venue::Entity::update(model).exec(&self.db).await?;
        Ok(())
    }

    pub async fn delete_venue(&self, id: i32) -> AppResult<()> {
        if venue::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("venue"));
        }
        venue::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}

pub fn today() -> Date {
    jiff::Zoned::now().into()
}

async fn insert_links(
    txn: &DatabaseTransaction,
    movie_id: i32,
    write: &MovieWrite,
) -> Result<(), DbErr> {
    for genre_id in &write.genre_ids {
        movie_genre::Entity::insert(movie_genre::ActiveModel {
            movie_id: Set(movie_id),
            genre_id: Set(*genre_id),
        })
        .exec(txn)
        .await?;
    }

    for venue_id in &write.venue_ids {
        movie_venue::Entity::insert(movie_venue::ActiveModel {
            movie_id: Set(movie_id),
            venue_id: Set(*venue_id),
        })
        .exec(txn)
        .await?;
    }

    // Billing order is the position in the submitted list, recomputed on
    // every write; the stored value is never carried over.
    for (position, entry) in write.cast.iter().enumerate() {
        movie_actor::Entity::insert(movie_actor::ActiveModel {
            movie_id: Set(movie_id),
            actor_id: Set(entry.actor_id),
            character: Set(entry.character.clone()),
            billing_order: Set(position as i32),
        })
        .exec(txn)
        .await?;
    }

    Ok(())
}

fn parse_date(value: &str, field: &str) -> AppResult<Date> {
    value
        .trim()
        .parse::<Date>()
        .map_err(|_| AppError::validation(format!("{field} must be an ISO date (YYYY-MM-DD)")))
}

fn validated_movie(mut write: MovieWrite) -> AppResult<MovieWrite> {
    let title = write.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title is required"));
    }
    if title.chars().count() > 300 {
        return Err(AppError::validation("title must be at most 300 characters"));
    }
    write.title = title.to_string();
    write.release_date = parse_date(&write.release_date, "release_date")?.to_string();

    let mut seen = HashSet::new();
    for entry in &write.cast {
        if !seen.insert(entry.actor_id) {
            return Err(AppError::validation("cast lists the same actor twice"));
        }
        if entry.character.chars().count() > 100 {
            return Err(AppError::validation("character must be at most 100 characters"));
        }
    }

    dedup(&mut write.genre_ids);
    dedup(&mut write.venue_ids);

    Ok(write)
}

fn dedup(ids: &mut Vec<i32>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

fn validated_genre_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if name.chars().count() > 50 {
        return Err(AppError::validation("name must be at most 50 characters"));
    }
    if !name.chars().next().is_some_and(char::is_uppercase) {
        return Err(AppError::validation("name must start with an uppercase letter"));
    }
    Ok(name.to_string())
}

fn validated_actor(mut write: ActorWrite) -> AppResult<ActorWrite> {
    let name = write.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if name.chars().count() > 200 {
        return Err(AppError::validation("name must be at most 200 characters"));
    }
    write.name = name.to_string();
    write.birth_date = parse_date(&write.birth_date, "birth_date")?.to_string();
    Ok(write)
}

fn validated_venue(mut write: VenueWrite) -> AppResult<VenueWrite> {
    let name = write.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if name.chars().count() > 100 {
        return Err(AppError::validation("name must be at most 100 characters"));
    }
    if !(-90.0..=90.0).contains(&write.latitude) {
        return Err(AppError::validation("latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&write.longitude) {
        return Err(AppError::validation("longitude must be between -180 and 180"));
    }
    write.name = name.to_string();
    Ok(write)
}
