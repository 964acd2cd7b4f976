//! Upload Flow: validate a booth form, store its image, insert the record.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::error::ValidationErrors;
use crate::record::{BoothRecord, NewBooth};
use crate::traits::{BlobStore, RecordStore};
use crate::types::{BlobPath, BoothId};

const MIN_TITLE_CHARS: usize = 2;
const MIN_AUTHOR_CHARS: usize = 2;
const MIN_DESCRIPTION_CHARS: usize = 10;
const FALLBACK_EXTENSION: &str = "bin";

/// An image chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    fn is_image(&self) -> bool {
        self.content_type.trim().to_ascii_lowercase().starts_with("image/") && !self.bytes.is_empty()
    }

    /// Lowercased extension for the stored object.
    ///
    /// Taken from the file name, else the content type's subtype, else `bin`.
    pub fn extension(&self) -> String {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .and_then(sanitize_extension);
        let from_type = || {
            let subtype = self.content_type.split_once('/')?.1;
            let subtype = subtype.split([';', '+']).next()?;
            sanitize_extension(subtype)
        };

        from_name
            .or_else(from_type)
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
    }
}

/// Image content type for a file extension, if it is a known image format.
pub fn image_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}

fn sanitize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// A submitted booth form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadForm {
    pub title: String,
    #[serde(rename = "studentsName", alias = "author")]
    pub author: String,
    pub description: String,
    #[serde(skip)]
    pub image: Option<ImageFile>,
}

impl UploadForm {
    /// Check every field, collecting all failures.
    ///
    /// Lengths count Unicode scalar values of the untrimmed input.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.title.chars().count() < MIN_TITLE_CHARS {
            errors.push("title", "Title must be at least 2 characters.");
        }
        if self.author.chars().count() < MIN_AUTHOR_CHARS {
            errors.push("studentsName", "Name must be at least 2 characters.");
        }
        if self.description.chars().count() < MIN_DESCRIPTION_CHARS {
            errors.push("description", "Description must be at least 10 characters.");
        }
        if !self.image.as_ref().is_some_and(ImageFile::is_image) {
            errors.push("image", "Please upload an image file.");
        }

        errors.into_result()
    }
}

/// Run the whole upload: validate, store the image, insert the record.
///
/// If the insert fails after the image was stored, the blob is left behind.
#[instrument(skip_all, fields(title = %form.title))]
pub async fn submit_booth<R, B>(records: &R, blobs: &B, form: UploadForm) -> Result<BoothRecord>
where
    R: RecordStore + ?Sized,
    B: BlobStore + ?Sized,
{
    form.validate()?;
    let UploadForm {
        title,
        author,
        description,
        image,
    } = form;
    let image = image.ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        errors.push("image", "Please upload an image file.");
        errors
    })?;

    let id = BoothId::generate();
    let path = BlobPath::for_booth_image(&id, &image.extension())?;

    let handle = blobs.upload(&path, &image.bytes, &image.content_type).await?;
    debug!(path = %handle.path, size = handle.size, "Stored booth image");
    let image_url = blobs.public_url(&path)?;

    let booth = NewBooth {
        id,
        title,
        author,
        description,
        image_url,
        likes: 0,
    };

    match records.insert(&booth).await {
        Ok(record) => {
            debug!(id = %record.id, "Booth submitted");
            Ok(record)
        }
        Err(err) => {
            warn!(path = %path, error = %err, "Record insert failed; image left orphaned");
            Err(err)
        }
    }
}
