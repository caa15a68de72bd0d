use serde::{Deserialize, Serialize};

use crate::entities::{actor, genre, movie, venue};

#[derive(Clone, Debug, Serialize)]
pub struct GenreView {
    pub id: i32,
    pub name: String,
}

impl From<genre::Model> for GenreView {
    fn from(m: genre::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenreWrite {
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActorView {
    pub id: i32,
    pub name: String,
    pub birth_date: String,
    pub photo: Option<String>,
}

impl From<actor::Model> for ActorView {
    fn from(m: actor::Model) -> Self {
        Self { id: m.id, name: m.name, birth_date: m.birth_date, photo: m.photo }
    }
}

#[derive(Clone, Debug)]
pub struct ActorWrite {
    pub name: String,
    pub birth_date: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct VenueView {
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<venue::Model> for VenueView {
    fn from(m: venue::Model) -> Self {
        Self { id: m.id, name: m.name, latitude: m.latitude, longitude: m.longitude }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct VenueWrite {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CastView {
    pub actor_id: i32,
    pub name: String,
    pub character: String,
    pub billing_order: i32,
    pub photo: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CastEntry {
    pub actor_id: i32,
    pub character: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub release_date: String,
    pub in_theaters: bool,
    pub poster: Option<String>,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            release_date: m.release_date,
            in_theaters: m.in_theaters,
            poster: m.poster,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    pub synopsis: Option<String>,
    pub release_date: String,
    pub in_theaters: bool,
    pub poster: Option<String>,
    pub average_score: f64,
    pub viewer_score: i32,
    pub genres: Vec<GenreView>,
    pub cast: Vec<CastView>,
    pub venues: Vec<VenueView>,
}

#[derive(Clone, Debug)]
pub struct MovieWrite {
    pub title: String,
    pub synopsis: Option<String>,
    pub release_date: String,
    pub in_theaters: bool,
    pub genre_ids: Vec<i32>,
    pub venue_ids: Vec<i32>,
    pub cast: Vec<CastEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LandingPage {
    pub upcoming: Vec<MovieSummary>,
    pub now_showing: Vec<MovieSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieFormOptions {
    pub genres: Vec<GenreView>,
    pub venues: Vec<VenueView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieEditOptions {
    pub movie: MovieDetail,
    pub unselected_genres: Vec<GenreView>,
    pub unselected_venues: Vec<VenueView>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RatingRequest {
    pub movie_id: i32,
    pub score: i32,
}
