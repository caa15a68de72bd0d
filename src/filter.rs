use jiff::civil::Date;
use sea_orm::{ColumnTrait, Condition, sea_query::Query};
use serde::Deserialize;

use crate::entities::{movie, movie_genre};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub in_theaters: bool,
    pub upcoming: bool,
    pub genre_id: Option<i32>,
}

impl MovieFilter {
    // Each provided criterion adds one clause; absent criteria add nothing.
    pub fn conditions(&self, today: Date) -> Condition {
        let mut cond = Condition::all();

        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            cond = cond.add(movie::Column::Title.contains(title));
        }

        if self.in_theaters {
            cond = cond.add(movie::Column::InTheaters.eq(true));
        }

        if self.upcoming {
            cond = cond.add(movie::Column::ReleaseDate.gt(today.to_string()));
        }

        // 0 is the "no genre selected" value some clients send; it never names
        // a real genre (ids start at 1).
        if let Some(genre_id) = self.genre_id.filter(|id| *id != 0) {
            cond = cond.add(
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_genre::Column::MovieId)
                        .from(movie_genre::Entity)
                        .and_where(movie_genre::Column::GenreId.eq(genre_id))
                        .to_owned(),
                ),
            );
        }

        cond
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn sql(filter: &MovieFilter) -> String {
        let today = Date::constant(2026, 8, 7);
        movie::Entity::find()
            .filter(filter.conditions(today))
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn empty_filter_adds_no_clauses() {
        let query = sql(&MovieFilter::default());
        assert!(!query.contains("WHERE"), "{query}");
    }

    #[test]
    fn provided_criteria_combine_with_and() {
        let filter = MovieFilter {
            title: Some("War".to_string()),
            upcoming: true,
            ..Default::default()
        };
        let query = sql(&filter);
        assert!(query.contains("LIKE '%War%'"), "{query}");
        assert!(query.contains("\"release_date\" > '2026-08-07'"), "{query}");
        assert!(query.contains(" AND "), "{query}");
    }

    #[test]
    fn genre_zero_is_treated_as_absent() {
        let filter = MovieFilter { genre_id: Some(0), ..Default::default() };
        let query = sql(&filter);
        assert!(!query.contains("WHERE"), "{query}");
    }

    #[test]
    fn genre_filter_uses_link_subquery() {
        let filter = MovieFilter { genre_id: Some(3), ..Default::default() };
        let query = sql(&filter);
        assert!(query.contains("IN (SELECT"), "{query}");
        assert!(query.contains("\"genre_id\" = 3"), "{query}");
    }

    #[test]
    fn blank_title_is_treated_as_absent() {
        let filter = MovieFilter { title: Some("   ".to_string()), ..Default::default() };
        let query = sql(&filter);
        assert!(!query.contains("WHERE"), "{query}");
    }
}
