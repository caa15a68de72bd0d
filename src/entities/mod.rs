pub mod actor;
pub mod genre;
pub mod movie;
pub mod movie_actor;
pub mod movie_genre;
pub mod movie_venue;
pub mod rating;
pub mod venue;
