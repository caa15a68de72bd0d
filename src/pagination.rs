use axum::{
    Json,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QuerySelect, Select};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

// Delivered as a response header so the payload stays a plain list.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl PageQuery {
    pub fn clamped(self, max_page_size: u64) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.page_size
    }
}

#[derive(Clone, Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged { items: self.items.into_iter().map(f).collect(), total: self.total }
    }
}

impl<T: Serialize> IntoResponse for Paged<T> {
    fn into_response(self) -> Response {
        let mut resp = Json(self.items).into_response();
        resp.headers_mut().insert(TOTAL_COUNT_HEADER, HeaderValue::from(self.total));
        resp
    }
}

pub async fn paginate<C, E>(db: &C, select: Select<E>, page: &PageQuery) -> AppResult<Paged<E::Model>>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    // Count before slicing; a page past the end still reports the true total.
    let total = select.clone().count(db).await?;
    let items = select.offset(page.offset()).limit(page.page_size).all(db).await?;
    Ok(Paged { items, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_size_to_maximum() {
        let page = PageQuery { page: 1, page_size: 10_000 }.clamped(50);
        assert_eq!(page.page_size, 50);
    }

    #[test]
    fn clamps_zero_page_and_size() {
        let page = PageQuery { page: 0, page_size: 0 }.clamped(50);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn offset_skips_earlier_pages() {
        let page = PageQuery { page: 3, page_size: 10 }.clamped(50);
        assert_eq!(page.offset(), 20);
    }
}
