//! Where uploaded files end up.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `content` under `name` and return the public URL of the file.
    async fn save(&self, name: &str, content: &[u8]) -> Result<String, String>;
}

/// Files on local disk, served by the app under `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            public_prefix: "/uploads".to_string(),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, name: &str, content: &[u8]) -> Result<String, String> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(format!("Invalid file name: {name}"));
        }

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("Failed to create upload dir: {e}"))?;

        fs::write(self.base_path.join(name), content)
            .await
            .map_err(|e| format!("Failed to write upload: {e}"))?;

        Ok(format!("{}/{name}", self.public_prefix))
    }
}
