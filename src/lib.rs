pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod storage;
pub mod viewer;

use std::sync::Arc;

use crate::{catalog::Catalog, config::Config, storage::AssetStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
    pub assets: AssetStore,
}
