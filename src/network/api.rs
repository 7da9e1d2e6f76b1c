use std::future::Future;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::common::{ChatMessage, RoomRef};
use crate::error::ClientError;

/// A local file read into memory, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Where the service stored an upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub url: String,
}

#[derive(Serialize)]
struct CreateRoomBody<'a> {
    name: &'a str,
}

/// Request/response calls against the chat service.
pub trait ChatApi: Clone + Send + Sync + 'static {
    fn create_room(&self, name: String) -> impl Future<Output = Result<RoomRef, ClientError>> + Send;

    /// One page of a room's history, newest first.
    fn list_messages(
        &self,
        room_id: i64,
        skip: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, ClientError>> + Send;

    fn upload(&self, file: UploadFile) -> impl Future<Output = Result<UploadedFile, ClientError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base: &Url) -> Self {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    /// Makes a service-relative media URL such as `/uploads/cat.png` absolute.
    pub fn resolve_media_url(&self, content: &str) -> String {
        match Url::parse(content) {
            Ok(url) => url.to_string(),
            Err(_) => self
                .base
                .join(content)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| content.to_string()),
        }
    }
}

impl ChatApi for HttpApi {
    async fn create_room(&self, name: String) -> Result<RoomRef, ClientError> {
        let url = self.endpoint("rooms/")?;
        let room = self
            .client
            .post(url)
            .json(&CreateRoomBody { name: &name })
            .send()
            .await?
            .error_for_status()?
            .json::<RoomRef>()
            .await?;
        Ok(room)
    }

    async fn list_messages(
        &self,
        room_id: i64,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let url = self.endpoint(&format!("rooms/{room_id}/messages/"))?;
        let page = self
            .client
            .get(url)
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ChatMessage>>()
            .await?;
        Ok(page)
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadedFile, ClientError> {
        let url = self.endpoint("upload/")?;
        let part = Part::bytes(file.bytes).file_name(file.filename);
        let form = Form::new().part("file", part);
        let uploaded = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<UploadedFile>()
            .await?;
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path() {
        let api = HttpApi::new(&Url::parse("http://localhost:8000/chat").unwrap());
        assert_eq!(
            api.endpoint("rooms/7/messages/").unwrap().as_str(),
            "http://localhost:8000/chat/rooms/7/messages/"
        );

        let api = HttpApi::new(&Url::parse("http://localhost:8000").unwrap());
        assert_eq!(
            api.endpoint("upload/").unwrap().as_str(),
            "http://localhost:8000/upload/"
        );
    }

    #[test]
    fn relative_media_urls_resolve_against_the_service() {
        let api = HttpApi::new(&Url::parse("http://localhost:8000").unwrap());
        assert_eq!(
            api.resolve_media_url("/uploads/cat.png"),
            "http://localhost:8000/uploads/cat.png"
        );
        assert_eq!(api.resolve_media_url("https://x/y.png"), "https://x/y.png");
    }
}
