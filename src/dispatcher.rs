use std::future::Future;

use anyhow::Result;

use crate::document_parser::decode_document;
use crate::outcome::{ConversionError, ConversionOutcome, DocumentFormat, RawDocument};
use crate::toolkit::{Toolkit, shared_toolkit};

/// A document handed to the pipeline: its extension plus a way to fetch its bytes
pub trait DocumentSource: Send + Sync {
    /// File extension without the leading dot, any case
    fn extension(&self) -> &str;

    fn read_bytes(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Bytes already in memory
#[derive(Debug, Clone)]
pub struct InMemorySource {
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl InMemorySource {
    pub fn new(extension: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            extension: extension.into(),
            bytes,
        }
    }
}

impl DocumentSource for InMemorySource {
    fn extension(&self) -> &str {
        &self.extension
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Selects a decoder by extension and runs it against the document bytes
#[derive(Debug, Clone)]
pub struct Converter {
    toolkit: Toolkit,
}

impl Converter {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    /// Converter sharing the process-wide toolkit
    pub async fn shared() -> Self {
        Self::new(shared_toolkit().await.clone())
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Convert one document. Unknown extensions fail before any bytes are read;
    /// otherwise the bytes are read once and the decoder's outcome is returned unchanged.
    pub async fn convert_file<S>(&self, source: &S) -> ConversionOutcome
    where
        S: DocumentSource,
    {
        let extension = source.extension().trim_start_matches('.').to_lowercase();
        let Some(format) = DocumentFormat::from_extension(&extension) else {
            log::debug!("Rejecting unsupported extension .{}", extension);
            return ConversionOutcome::Failure(ConversionError::UnsupportedFormat(extension));
        };

        let bytes = match source.read_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return ConversionOutcome::Failure(ConversionError::Read(format!("{:#}", e))),
        };

        let toolkit = self.toolkit.clone();
        let document = RawDocument::new(format, bytes);
        match tokio::task::spawn_blocking(move || decode_document(&toolkit, &document)).await {
            Ok(outcome) => outcome,
            Err(e) => ConversionOutcome::Failure(ConversionError::Task(e.to_string())),
        }
    }
}

/// Convert one document with the process-wide toolkit
pub async fn convert_file<S>(source: &S) -> ConversionOutcome
where
    S: DocumentSource,
{
    Converter::shared().await.convert_file(source).await
}
