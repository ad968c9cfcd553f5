use std::path::PathBuf;
use crate::error::PlanError;
use crate::sync::{SnapshotDocument, SnapshotStore};

/// One JSON document per user under `<dir>/users/`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        FileSnapshotStore { dir: dir.into() }
    }

    pub fn path_for(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join("users").join(format!("{}.json", safe))
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, user_id: &str) -> Result<Option<SnapshotDocument>, PlanError> {
        let path = self.path_for(user_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                serde_json::from_str(&content)
                    .map_err(|e| PlanError::new(
                        format!("Failed to parse snapshot: {}", e),
                        "json_parse"
                    ).with_context(format!("path: {:?}", path)))
                    .map(Some)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(None)
            }
            Err(e) => {
                Err(PlanError::new(
                    format!("Failed to read snapshot: {}", e),
                    "io"
                ).with_context(format!("path: {:?}", path)))
            }
        }
    }

    async fn save(&self, user_id: &str, document: &SnapshotDocument) -> Result<(), PlanError> {
        let path = self.path_for(user_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PlanError::new(
                    format!("Failed to create directory: {}", e),
                    "io"
                ).with_context(format!("path: {:?}", parent)))?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| PlanError::new(
                format!("Failed to serialize snapshot: {}", e),
                "json_serialize"
            ))?;

        // Written to a temp file first, then renamed over the old document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| PlanError::new(
                format!("Failed to write snapshot: {}", e),
                "io"
            ).with_context(format!("path: {:?}", tmp)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PlanError::new(
                format!("Failed to replace snapshot: {}", e),
                "io"
            ).with_context(format!("path: {:?}", path)))?;

        Ok(())
    }
}
