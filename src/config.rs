use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub media_dir: PathBuf,
    pub frontend_url: Option<String>,
    pub max_page_size: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://marquee.db?mode=rwc".to_string());

        let media_dir =
            PathBuf::from(std::env::var("MEDIA_DIR").unwrap_or_else(|_| "media".to_string()));

        let frontend_url = std::env::var("FRONTEND_URL").ok().filter(|s| !s.is_empty());

        let max_page_size: u64 =
            std::env::var("MAX_PAGE_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(50);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            media_dir,
            frontend_url,
            max_page_size,
        })
    }
}
