use std::path::PathBuf;

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MOVIE_POSTERS: &str = "movies";
pub const ACTOR_PHOTOS: &str = "actors";

#[derive(Clone, Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub ext: Option<String>,
}

// Local-disk asset store. Handles are container-relative paths and double as
// the public URL path under /media.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save(&self, container: &str, upload: &Upload) -> AppResult<String> {
        let name = match &upload.ext {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let dir = self.root.join(container);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&name), &upload.bytes).await?;
        let handle = format!("{container}/{name}");
        debug!(handle = %handle, "stored asset");
        Ok(handle)
    }

    pub async fn replace(
        &self,
        container: &str,
        upload: &Upload,
        previous: Option<&str>,
    ) -> AppResult<String> {
        if let Some(handle) = previous {
            self.delete(handle).await?;
        }
        self.save(container, upload).await
    }

    pub async fn delete(&self, handle: &str) -> AppResult<()> {
        let path = self.resolve(handle)?;
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(handle = %handle, "deleted asset");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    // Handles come from save(); anything that escapes the root is rejected.
    fn resolve(&self, handle: &str) -> AppResult<PathBuf> {
        if handle.starts_with('/') || handle.split('/').any(|part| part == "..") {
            return Err(AppError::validation("invalid asset handle"));
        }
        Ok(self.root.join(handle))
    }
}
