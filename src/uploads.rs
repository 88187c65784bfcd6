//! Multipart parsing and on-disk storage for product images and payment
//! proofs.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use actix_multipart::{Field, Multipart};
use actix_web::web;
use futures::TryStreamExt;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_FILE_BYTES: usize = 2 * 1024 * 1024;
pub const MAX_FILES: usize = 10;
const MAX_TEXT_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files are allowed")]
    NotAnImage,

    #[error("File is larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("At most {limit} files can be uploaded at once")]
    TooManyFiles { limit: usize },

    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    #[error("could not store file: {0}")]
    Io(#[from] io::Error),
}

impl UploadError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub content_type: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// A fully buffered multipart body: text fields plus image parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }

    pub fn take_files(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        taken
    }
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, UploadError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        if buf.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Writes uploaded images under `dir` and hands back their public URLs.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_url: String,
    max_file_bytes: usize,
    max_files: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        ImageStore {
            dir: dir.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_file_bytes: MAX_FILE_BYTES,
            max_files: MAX_FILES,
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Buffers the whole request. Parts with a filename must be images within
    /// the size limit; a file input left empty by the browser is skipped.
    pub async fn read_form(&self, mut payload: Multipart) -> Result<MultipartForm, UploadError> {
        let mut form = MultipartForm::default();

        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let Some(filename) = filename else {
                let bytes = read_field(&mut field, MAX_TEXT_BYTES).await?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| UploadError::Multipart(format!("field {name} is not valid UTF-8")))?;
                form.fields.insert(name, text);
                continue;
            };

            let mime = field.content_type().cloned();
            let bytes = read_field(&mut field, self.max_file_bytes).await?;
            if filename.is_empty() && bytes.is_empty() {
                continue;
            }

            let Some(mime) = mime.filter(|m| m.type_().as_str() == "image") else {
                return Err(UploadError::NotAnImage);
            };
            if form.files.len() >= self.max_files {
                return Err(UploadError::TooManyFiles { limit: self.max_files });
            }

            let extension = mime
                .subtype()
                .as_str()
                .split('+')
                .next()
                .unwrap_or("img")
                .to_string();
            form.files.push(UploadedFile {
                field: name,
                content_type: mime.essence_str().to_string(),
                extension,
                bytes,
            });
        }

        Ok(form)
    }

    pub async fn save(&self, file: UploadedFile) -> Result<String, UploadError> {
        let name = format!("{}.{}", Uuid::new_v4(), file.extension);
        let dir = self.dir.clone();
        let path = dir.join(&name);

        web::block(move || {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&path, &file.bytes)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))??;

        log::info!("Stored upload {}", name);
        Ok(format!("{}/uploads/{}", self.public_url, name))
    }

    pub async fn save_all(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, UploadError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            urls.push(self.save(file).await?);
        }
        Ok(urls)
    }
}
