use std::path::{Path, PathBuf};

use crate::error::ClientError;
use crate::network::api::UploadFile;

use super::room::ActiveRoom;

/// An upload started for the room of `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub generation: u64,
}

/// Holds the file picked for upload until it has been relayed.
#[derive(Debug, Default)]
pub struct UploadRelay {
    selected: Option<PathBuf>,
}

impl UploadRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, path: Option<PathBuf>) {
        self.selected = path;
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn begin(&self, active: Option<&ActiveRoom>) -> Result<UploadRequest, ClientError> {
        let path = self
            .selected
            .clone()
            .ok_or_else(|| ClientError::validation("Choose an image first"))?;
        let active = active.ok_or_else(|| ClientError::validation("Join a room first"))?;
        Ok(UploadRequest {
            path,
            generation: active.generation,
        })
    }

    /// Clears the selection after a successful upload, unless another file was picked meanwhile.
    pub fn complete(&mut self, request: &UploadRequest) {
        if self.selected.as_ref() == Some(&request.path) {
            self.selected = None;
        }
    }
}

pub async fn read_upload(path: &Path) -> Result<UploadFile, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(UploadFile { filename, bytes })
}

#[cfg(test)]
mod tests {
    use crate::common::{Identity, RoomRef};

    use super::*;

    fn lobby() -> ActiveRoom {
        ActiveRoom {
            room: RoomRef {
                name: "lobby".to_string(),
                id: 7,
            },
            identity: Identity::new("alice"),
            generation: 4,
        }
    }

    #[test]
    fn begin_requires_file_then_room() {
        let mut relay = UploadRelay::new();
        let err = relay.begin(Some(&lobby())).unwrap_err();
        assert_eq!(err.to_string(), "Choose an image first");

        relay.select(Some(PathBuf::from("cat.png")));
        let err = relay.begin(None).unwrap_err();
        assert_eq!(err.to_string(), "Join a room first");

        let request = relay.begin(Some(&lobby())).unwrap();
        assert_eq!(request.generation, 4);
        assert_eq!(request.path, PathBuf::from("cat.png"));
    }

    #[test]
    fn selection_cleared_only_by_completion() {
        let mut relay = UploadRelay::new();
        relay.select(Some(PathBuf::from("cat.png")));
        let request = relay.begin(Some(&lobby())).unwrap();
        assert!(relay.selected().is_some());

        relay.complete(&request);
        assert!(relay.selected().is_none());
    }

    #[test]
    fn newer_selection_survives_completion() {
        let mut relay = UploadRelay::new();
        relay.select(Some(PathBuf::from("cat.png")));
        let request = relay.begin(Some(&lobby())).unwrap();
        relay.select(Some(PathBuf::from("dog.png")));

        relay.complete(&request);
        assert_eq!(relay.selected(), Some(Path::new("dog.png")));
    }

    #[tokio::test]
    async fn reads_file_with_its_name() {
        let path = std::env::temp_dir().join(format!("upload-{}.png", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        let file = read_upload(&path).await.unwrap();
        assert_eq!(file.bytes, b"\x89PNG");
        assert_eq!(Some(file.filename.as_str()), path.file_name().and_then(|n| n.to_str()));

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(matches!(read_upload(&path).await, Err(ClientError::Io(_))));
    }
}
