//! Record Store and Blob Store over the booth server API.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use booth_core::error::{Error, InvalidInputError};
use booth_core::{
    BlobHandle, BlobPath, BlobStore, BoothId, BoothPatch, BoothRecord, ListOrder, NewBooth,
    RecordStore, Result, StoreUrl, UploadForm,
};

use crate::changes::HttpChanges;
use crate::client::ApiClient;

const FESTIVALS: &str = "festivals";

/// A remote booth server used as a store.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: ApiClient,
}

impl HttpStore {
    pub fn new(base: StoreUrl) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(base)?,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn booth_url(&self, id: &BoothId) -> Result<reqwest::Url> {
        self.client.endpoint(["api", FESTIVALS, id.as_str()])
    }

    fn blob_url(&self, path: &BlobPath) -> Result<reqwest::Url> {
        self.client
            .endpoint(std::iter::once("storage").chain(path.as_str().split('/')))
    }

    /// Check the server is reachable.
    pub async fn health(&self) -> Result<()> {
        let url = self.client.endpoint(["api", "health"])?;
        self.client.send_no_content(Method::GET, url).await
    }

    /// Submit a booth form; the server runs the whole upload flow.
    #[instrument(skip(self, form), fields(title = %form.title))]
    pub async fn upload_form(&self, form: &UploadForm) -> Result<BoothRecord> {
        let mut multipart = Form::new()
            .text("title", form.title.clone())
            .text("studentsName", form.author.clone())
            .text("description", form.description.clone());

        if let Some(image) = &form.image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .map_err(|e| {
                    Error::InvalidInput(InvalidInputError::Other {
                        message: format!("Invalid image content type: {}", e),
                    })
                })?;
            multipart = multipart.part("image", part);
        }

        let url = self.client.endpoint(["api", FESTIVALS])?;
        let record: BoothRecord = self.client.post_multipart(url, multipart).await?;
        debug!(id = %record.id, "Booth uploaded");
        Ok(record)
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    type Changes = HttpChanges;

    async fn list(&self, order: ListOrder) -> Result<Vec<BoothRecord>> {
        let url = self.client.endpoint(["api", FESTIVALS])?;
        let query = [
            ("orderBy", order.order_by.as_str()),
            ("direction", order.direction.as_str()),
        ];
        self.client.get_json(url, &query).await
    }

    async fn get(&self, id: &BoothId) -> Result<BoothRecord> {
        let url = self.booth_url(id)?;
        self.client.send_empty(Method::GET, url).await
    }

    #[instrument(skip(self, booth), fields(id = %booth.id))]
    async fn insert(&self, booth: &NewBooth) -> Result<BoothRecord> {
        let url = self.booth_url(&booth.id)?;
        self.client.send_json(Method::PUT, url, booth).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &BoothId, patch: &BoothPatch) -> Result<BoothRecord> {
        patch.ensure_not_empty()?;
        let url = self.booth_url(id)?;
        self.client.send_json(Method::PATCH, url, patch).await
    }

    #[instrument(skip(self))]
    async fn increment_likes(&self, id: &BoothId) -> Result<BoothRecord> {
        let url = self.client.endpoint(["api", FESTIVALS, id.as_str(), "like"])?;
        self.client.send_empty(Method::POST, url).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &BoothId) -> Result<()> {
        let url = self.booth_url(id)?;
        self.client.send_no_content(Method::DELETE, url).await
    }

    async fn subscribe(&self) -> Result<Self::Changes> {
        let url = self.client.base().ws_url("api/festivals/changes");
        HttpChanges::connect(&url).await
    }
}

#[async_trait]
impl BlobStore for HttpStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &BlobPath,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<BlobHandle> {
        let url = self.blob_url(path)?;
        self.client.put_bytes(url, bytes.to_vec(), content_type).await
    }

    async fn download(&self, path: &BlobPath) -> Result<Vec<u8>> {
        let url = self.blob_url(path)?;
        self.client.get_bytes(url).await
    }

    fn public_url(&self, path: &BlobPath) -> Result<String> {
        Ok(self.blob_url(path)?.to_string())
    }
}
