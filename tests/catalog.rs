use marquee::{
    catalog::{Catalog, today},
    db,
    entities::{movie_actor, movie_genre, rating},
    error::AppError,
    filter::MovieFilter,
    models::{CastEntry, GenreWrite, MovieWrite, VenueWrite},
    pagination::PageQuery,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

async fn test_catalog() -> Catalog {
    let db = db::connect_and_migrate("sqlite::memory:").await.expect("connect");
    Catalog::new(db, 50)
}

fn movie(title: &str, release_date: &str, in_theaters: bool) -> MovieWrite {
    MovieWrite {
        title: title.to_string(),
        synopsis: None,
        release_date: release_date.to_string(),
        in_theaters,
        genre_ids: Vec::new(),
        venue_ids: Vec::new(),
        cast: Vec::new(),
    }
}

fn genre(name: &str) -> GenreWrite {
    GenreWrite { name: name.to_string() }
}

fn page(page: u64, page_size: u64) -> PageQuery {
    PageQuery { page, page_size }
}

async fn seed_actor(catalog: &Catalog, name: &str) -> i32 {
    catalog
        .create_actor(
            marquee::models::ActorWrite {
                name: name.to_string(),
                birth_date: "1980-01-01".to_string(),
            },
            None,
        )
        .await
        .expect("create actor")
}

#[tokio::test]
async fn pagination_covers_the_source_exactly() {
    let catalog = test_catalog().await;
    for name in ["Action", "Comedy", "Drama", "Fantasy", "Horror", "Mystery", "Romance"] {
        catalog.create_genre(genre(name)).await.expect("create genre");
    }

    let mut seen = Vec::new();
    for n in 1..=3 {
        let paged = catalog.list_genres(page(n, 3)).await.expect("list");
        assert_eq!(paged.total, 7, "total reported on page {n}");
        seen.extend(paged.items.into_iter().map(|g| g.name));
    }
    assert_eq!(seen.len(), 7);

    let beyond = catalog.list_genres(page(4, 3)).await.expect("list");
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 7);
}

#[tokio::test]
async fn page_size_is_clamped_to_the_maximum() {
    let db = db::connect_and_migrate("sqlite::memory:").await.expect("connect");
    let catalog = Catalog::new(db, 2);
    for name in ["Action", "Comedy", "Drama"] {
        catalog.create_genre(genre(name)).await.expect("create genre");
    }

    let paged = catalog.list_genres(page(1, 500)).await.expect("list");
    assert_eq!(paged.items.len(), 2);
    assert_eq!(paged.total, 3);
}

#[tokio::test]
async fn billing_order_follows_submission_order() {
    let catalog = test_catalog().await;
    let chaplin = seed_actor(&catalog, "Charlie Chaplin").await;
    let keaton = seed_actor(&catalog, "Buster Keaton").await;
    let lloyd = seed_actor(&catalog, "Harold Lloyd").await;

    let mut write = movie("The General", "1926-12-31", false);
    write.cast = vec![
        CastEntry { actor_id: lloyd, character: "Stranger".to_string() },
        CastEntry { actor_id: chaplin, character: "Tramp".to_string() },
        CastEntry { actor_id: keaton, character: "Johnnie".to_string() },
    ];
    let id = catalog.create_movie(write, None).await.expect("create movie");

    let view = catalog.movie_view(id, None).await.expect("view");
    let order: Vec<(i32, i32)> =
        view.cast.iter().map(|c| (c.actor_id, c.billing_order)).collect();
    assert_eq!(order, vec![(lloyd, 0), (chaplin, 1), (keaton, 2)]);
}

#[tokio::test]
async fn cast_update_replaces_rows_and_recomputes_billing() {
    let catalog = test_catalog().await;
    let first = seed_actor(&catalog, "First").await;
    let second = seed_actor(&catalog, "Second").await;

    let mut write = movie("Recast", "2020-01-01", false);
    write.cast = vec![
        CastEntry { actor_id: first, character: "Lead".to_string() },
        CastEntry { actor_id: second, character: "Support".to_string() },
    ];
    let id = catalog.create_movie(write, None).await.expect("create");

    let mut update = movie("Recast", "2020-01-01", false);
    update.cast = vec![CastEntry { actor_id: second, character: "Lead".to_string() }];
    catalog.update_movie(id, update, None).await.expect("update");

    let rows = movie_actor::Entity::find()
        .filter(movie_actor::Column::MovieId.eq(id))
        .all(catalog.db())
        .await
        .expect("query links");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].actor_id, second);
    assert_eq!(rows[0].billing_order, 0);
    assert_eq!(rows[0].character, "Lead");
}

#[tokio::test]
async fn duplicate_cast_actor_is_rejected() {
    let catalog = test_catalog().await;
    let actor = seed_actor(&catalog, "Solo").await;

    let mut write = movie("Twins", "2020-01-01", false);
    write.cast = vec![
        CastEntry { actor_id: actor, character: "One".to_string() },
        CastEntry { actor_id: actor, character: "Two".to_string() },
    ];
    let err = catalog.create_movie(write, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn rating_aggregates_are_viewer_scoped() {
    let catalog = test_catalog().await;
    let id = catalog.create_movie(movie("Rated", "2020-01-01", false), None).await.expect("create");

    catalog.submit_rating("alice", id, 3).await.expect("rate");
    catalog.submit_rating("bob", id, 5).await.expect("rate");
    catalog.submit_rating("carol", id, 4).await.expect("rate");

    let (average, score) = catalog.ratings_for(id, Some("bob")).await.expect("ratings");
    assert_eq!(average, 4.0);
    assert_eq!(score, 5);

    let (_, none_score) = catalog.ratings_for(id, Some("dave")).await.expect("ratings");
    assert_eq!(none_score, 0);

    let (anon_average, anon_score) = catalog.ratings_for(id, None).await.expect("ratings");
    assert_eq!(anon_average, 4.0);
    assert_eq!(anon_score, 0);
}

#[tokio::test]
async fn unrated_movie_averages_to_zero() {
    let catalog = test_catalog().await;
    let id = catalog.create_movie(movie("Quiet", "2020-01-01", false), None).await.expect("create");

    let (average, score) = catalog.ratings_for(id, Some("alice")).await.expect("ratings");
    assert_eq!(average, 0.0);
    assert_eq!(score, 0);
}

#[tokio::test]
async fn rating_resubmission_overwrites_instead_of_duplicating() {
    let catalog = test_catalog().await;
    let id = catalog.create_movie(movie("Redo", "2020-01-01", false), None).await.expect("create");

    catalog.submit_rating("alice", id, 3).await.expect("rate");
    catalog.submit_rating("alice", id, 5).await.expect("rate again");

    let count = rating::Entity::find()
        .filter(rating::Column::MovieId.eq(id))
        .count(catalog.db())
        .await
        .expect("count");
    assert_eq!(count, 1);

    let (average, score) = catalog.ratings_for(id, Some("alice")).await.expect("ratings");
    assert_eq!(average, 5.0);
    assert_eq!(score, 5);
}

#[tokio::test]
async fn out_of_range_scores_are_rejected() {
    let catalog = test_catalog().await;
    let id = catalog.create_movie(movie("Bounds", "2020-01-01", false), None).await.expect("create");

    for score in [0, 6, -1] {
        let err = catalog.submit_rating("alice", id, score).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "score {score}");
    }

    let err = catalog.submit_rating("alice", 9999, 3).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn filters_intersect_and_default_to_everything() {
    let catalog = test_catalog().await;
    let action = catalog.create_genre(genre("Action")).await.expect("genre");
    let drama = catalog.create_genre(genre("Drama")).await.expect("genre");

    let mut war_games = movie("War Games", "1983-06-03", false);
    war_games.genre_ids = vec![action];
    let mut war_and_peace = movie("War and Peace", "1956-08-21", false);
    war_and_peace.genre_ids = vec![drama];
    let mut peace = movie("Peacemaker", "1997-09-26", false);
    peace.genre_ids = vec![action];

    catalog.create_movie(war_games, None).await.expect("create");
    catalog.create_movie(war_and_peace, None).await.expect("create");
    catalog.create_movie(peace, None).await.expect("create");

    let filter = MovieFilter {
        title: Some("War".to_string()),
        genre_id: Some(action),
        ..Default::default()
    };
    let paged = catalog.filter_movies(&filter, page(1, 10)).await.expect("filter");
    assert_eq!(paged.total, 1);
    assert_eq!(paged.items[0].title, "War Games");

    let unfiltered =
        catalog.filter_movies(&MovieFilter::default(), page(1, 2)).await.expect("filter");
    assert_eq!(unfiltered.total, 3);
    assert_eq!(unfiltered.items.len(), 2);

    let sentinel = MovieFilter { genre_id: Some(0), ..Default::default() };
    let paged = catalog.filter_movies(&sentinel, page(1, 10)).await.expect("filter");
    assert_eq!(paged.total, 3);
}

#[tokio::test]
async fn upcoming_filter_uses_release_date() {
    let catalog = test_catalog().await;
    let future = today().tomorrow().expect("tomorrow").to_string();
    let past = today().yesterday().expect("yesterday").to_string();

    catalog.create_movie(movie("Future", &future, false), None).await.expect("create");
    catalog.create_movie(movie("Past", &past, true), None).await.expect("create");

    let filter = MovieFilter { upcoming: true, ..Default::default() };
    let paged = catalog.filter_movies(&filter, page(1, 10)).await.expect("filter");
    assert_eq!(paged.total, 1);
    assert_eq!(paged.items[0].title, "Future");

    let filter = MovieFilter { in_theaters: true, ..Default::default() };
    let paged = catalog.filter_movies(&filter, page(1, 10)).await.expect("filter");
    assert_eq!(paged.total, 1);
    assert_eq!(paged.items[0].title, "Past");
}

#[tokio::test]
async fn landing_lists_are_capped_and_date_ordered() {
    let catalog = test_catalog().await;

    for n in 1..=8u8 {
        let date = today()
            .checked_add(jiff::Span::new().days(n as i64))
            .expect("future date")
            .to_string();
        catalog.create_movie(movie(&format!("Upcoming {n}"), &date, false), None).await.expect("create");
    }
    let past = today().yesterday().expect("yesterday").to_string();
    catalog.create_movie(movie("Showing", &past, true), None).await.expect("create");
    catalog.create_movie(movie("Archived", &past, false), None).await.expect("create");

    let landing = catalog.landing().await.expect("landing");

    assert_eq!(landing.upcoming.len(), 6);
    assert_eq!(landing.upcoming[0].title, "Upcoming 1");
    let mut dates: Vec<String> =
        landing.upcoming.iter().map(|m| m.release_date.clone()).collect();
    let sorted = dates.clone();
    dates.sort();
    assert_eq!(dates, sorted);
    assert!(landing.upcoming.iter().all(|m| m.title != "Showing" && m.title != "Archived"));

    assert_eq!(landing.now_showing.len(), 1);
    assert_eq!(landing.now_showing[0].title, "Showing");
}

#[tokio::test]
async fn assembled_view_projects_all_relations() {
    let catalog = test_catalog().await;
    let action = catalog.create_genre(genre("Action")).await.expect("genre");
    let venue = catalog
        .create_venue(VenueWrite { name: "Roxy".to_string(), latitude: 40.7, longitude: -74.0 })
        .await
        .expect("venue");
    let actor = seed_actor(&catalog, "Lead").await;

    let mut write = movie("Full House", "2020-05-01", true);
    write.synopsis = Some("Everything attached".to_string());
    write.genre_ids = vec![action];
    write.venue_ids = vec![venue];
    write.cast = vec![CastEntry { actor_id: actor, character: "Hero".to_string() }];
    let id = catalog.create_movie(write, None).await.expect("create");

    let view = catalog.movie_view(id, None).await.expect("view");
    assert_eq!(view.genres.len(), 1);
    assert_eq!(view.genres[0].name, "Action");
    assert_eq!(view.venues.len(), 1);
    assert_eq!(view.venues[0].name, "Roxy");
    assert_eq!(view.cast.len(), 1);
    assert_eq!(view.cast[0].name, "Lead");
    assert_eq!(view.cast[0].character, "Hero");

    let err = catalog.movie_view(9999, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn update_replaces_genre_and_venue_links() {
    let catalog = test_catalog().await;
    let action = catalog.create_genre(genre("Action")).await.expect("genre");
    let drama = catalog.create_genre(genre("Drama")).await.expect("genre");
    let comedy = catalog.create_genre(genre("Comedy")).await.expect("genre");

    let mut write = movie("Shifting", "2020-01-01", false);
    write.genre_ids = vec![action, drama];
    let id = catalog.create_movie(write, None).await.expect("create");

    let mut update = movie("Shifting", "2020-01-01", false);
    update.genre_ids = vec![drama, comedy];
    catalog.update_movie(id, update, None).await.expect("update");

    let mut linked: Vec<i32> = movie_genre::Entity::find()
        .filter(movie_genre::Column::MovieId.eq(id))
        .all(catalog.db())
        .await
        .expect("links")
        .into_iter()
        .map(|l| l.genre_id)
        .collect();
    linked.sort();
    let mut expected = vec![drama, comedy];
    expected.sort();
    assert_eq!(linked, expected);
}

#[tokio::test]
async fn genre_names_must_be_capitalized() {
    let catalog = test_catalog().await;

    let err = catalog.create_genre(genre("action")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = catalog.create_genre(genre("")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let id = catalog.create_genre(genre("Action")).await.expect("create");
    let err = catalog.update_genre(id, genre("noir")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_genre_spares_its_movies() {
    let catalog = test_catalog().await;
    let action = catalog.create_genre(genre("Action")).await.expect("genre");

    let mut write = movie("Survivor", "2020-01-01", false);
    write.genre_ids = vec![action];
    let id = catalog.create_movie(write, None).await.expect("create");

    catalog.delete_genre(action).await.expect("delete genre");

    let view = catalog.movie_view(id, None).await.expect("view");
    assert!(view.genres.is_empty());
}

#[tokio::test]
async fn deleting_a_movie_drops_rows_and_returns_the_poster() {
    let catalog = test_catalog().await;
    let actor = seed_actor(&catalog, "Gone").await;

    let mut write = movie("Ephemeral", "2020-01-01", false);
    write.cast = vec![CastEntry { actor_id: actor, character: "Ghost".to_string() }];
    let id = catalog
        .create_movie(write, Some("movies/poster.jpg".to_string()))
        .await
        .expect("create");
    catalog.submit_rating("alice", id, 4).await.expect("rate");

    let poster = catalog.delete_movie(id).await.expect("delete");
    assert_eq!(poster.as_deref(), Some("movies/poster.jpg"));

    let err = catalog.movie_view(id, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let links = movie_actor::Entity::find()
        .filter(movie_actor::Column::MovieId.eq(id))
        .count(catalog.db())
        .await
        .expect("count");
    assert_eq!(links, 0);

    let ratings = rating::Entity::find()
        .filter(rating::Column::MovieId.eq(id))
        .count(catalog.db())
        .await
        .expect("count");
    assert_eq!(ratings, 0);
}

#[tokio::test]
async fn movie_writes_validate_their_fields() {
    let catalog = test_catalog().await;

    let err = catalog.create_movie(movie("", "2020-01-01", false), None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = catalog.create_movie(movie("Undated", "not-a-date", false), None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn venue_coordinates_are_validated() {
    let catalog = test_catalog().await;

    let err = catalog
        .create_venue(VenueWrite { name: "Nowhere".to_string(), latitude: 91.0, longitude: 0.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = catalog
        .create_venue(VenueWrite { name: "Nowhere".to_string(), latitude: 0.0, longitude: 181.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn edit_options_split_selected_from_unselected() {
    let catalog = test_catalog().await;
    let action = catalog.create_genre(genre("Action")).await.expect("genre");
    catalog.create_genre(genre("Drama")).await.expect("genre");

    let mut write = movie("Editable", "2020-01-01", false);
    write.genre_ids = vec![action];
    let id = catalog.create_movie(write, None).await.expect("create");

    let options = catalog.movie_edit_options(id).await.expect("options");
    assert_eq!(options.movie.genres.len(), 1);
    assert_eq!(options.movie.genres[0].name, "Action");
    assert_eq!(options.unselected_genres.len(), 1);
    assert_eq!(options.unselected_genres[0].name, "Drama");
}

#[tokio::test]
async fn actor_search_matches_substrings() {
    let catalog = test_catalog().await;
    seed_actor(&catalog, "Edward Norton").await;
    seed_actor(&catalog, "Edward Furlong").await;
    seed_actor(&catalog, "Natalie Portman").await;

    let found = catalog.search_actors("edward").await.expect("search");
    assert_eq!(found.len(), 2);

    let blank = catalog.search_actors("   ").await.expect("search");
    assert!(blank.is_empty());
}
