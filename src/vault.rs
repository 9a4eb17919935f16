//! Host glue: a vault of files, converted notes with frontmatter, batch and
//! debounced automatic conversion.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::task::JoinHandle;

use crate::config::ConverterSettings;
use crate::dispatcher::{Converter, DocumentSource};
use crate::outcome::{ConversionOutcome, DocumentFormat};

/// Storage the converted notes live in; paths are vault-relative with `/` separators
pub trait Vault: Send + Sync {
    fn read_binary(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    fn exists(&self, path: &str) -> impl Future<Output = bool> + Send;

    /// Create or overwrite a text file
    fn write(&self, path: &str, content: &str) -> impl Future<Output = Result<()>> + Send;

    fn create_folder(&self, path: &str) -> impl Future<Output = Result<()>> + Send;

    fn list_files(&self) -> impl Future<Output = Result<Vec<VaultFile>>> + Send;
}

/// Where converted Markdown is shown to the user
pub trait PreviewSink: Send + Sync {
    fn show(&self, title: &str, markdown: &str);
}

/// A file inside the vault
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultFile {
    pub path: String,
}

impl VaultFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name with extension
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its extension
    pub fn basename(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }

    pub fn extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => "",
            Some(dot) => &name[dot + 1..],
        }
    }

    /// Parent folder path; empty at the vault root
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(slash) => &self.path[..slash],
            None => "",
        }
    }
}

/// True for the office formats the converter handles
pub fn is_supported_extension(extension: &str) -> bool {
    DocumentFormat::from_extension(extension).is_some()
}

/// Path of the note a source file is converted into
pub fn markdown_output_path(file: &VaultFile, settings: &ConverterSettings) -> String {
    let folder = output_folder(settings);
    if !folder.is_empty() {
        return format!("{}{}.md", folder, file.basename());
    }

    let parent = file.parent();
    if parent.is_empty() {
        format!("{}.md", file.basename())
    } else {
        format!("{}/{}.md", parent, file.basename())
    }
}

fn output_folder(settings: &ConverterSettings) -> String {
    let mut folder = settings.output_folder.trim().to_string();
    if !folder.is_empty() && !folder.ends_with('/') {
        folder.push('/');
    }
    folder
}

/// YAML frontmatter written above every converted note
pub fn frontmatter(file: &VaultFile, converted_at: DateTime<Utc>) -> String {
    format!(
        "---\ntitle: {}\nsource: {}\nconverted: {}\n---\n\n",
        file.basename(),
        file.path,
        converted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Tally of a batch conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// A vault file read through its vault
struct VaultDocument<'a, V: Vault> {
    vault: &'a V,
    file: &'a VaultFile,
}

impl<V: Vault> DocumentSource for VaultDocument<'_, V> {
    fn extension(&self) -> &str {
        self.file.extension()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        self.vault.read_binary(&self.file.path).await
    }
}

/// Converts vault files and stores or previews the result according to the settings
pub struct ConversionService<V: Vault> {
    vault: V,
    converter: Converter,
    settings: ConverterSettings,
    preview: Option<Arc<dyn PreviewSink>>,
}

impl<V: Vault + 'static> ConversionService<V> {
    pub fn new(vault: V, converter: Converter, settings: ConverterSettings) -> Self {
        Self {
            vault,
            converter,
            settings,
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: Arc<dyn PreviewSink>) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn settings(&self) -> &ConverterSettings {
        &self.settings
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub async fn convert(&self, file: &VaultFile) -> ConversionOutcome {
        let source = VaultDocument {
            vault: &self.vault,
            file,
        };
        self.converter.convert_file(&source).await
    }

    /// Convert, then save and preview as configured. Failures save nothing.
    /// Returns the path of the saved note, if one was written.
    pub async fn convert_and_handle(&self, file: &VaultFile) -> Result<Option<String>> {
        log::info!("Converting {}", file.path);
        let markdown = self
            .convert(file)
            .await
            .into_markdown()
            .with_context(|| format!("转换失败：{}", file.name()))?;

        let saved = if self.settings.save_markdown {
            Some(self.save_markdown(file, &markdown, Utc::now()).await?)
        } else {
            None
        };
        if self.settings.open_preview {
            self.show_preview(file, &markdown);
        }

        log::info!("{} 转换完成！", file.name());
        Ok(saved)
    }

    /// Convert and show the result without saving it
    pub async fn convert_and_preview(&self, file: &VaultFile) -> Result<String> {
        let markdown = self
            .convert(file)
            .await
            .into_markdown()
            .with_context(|| format!("解析失败：{}", file.name()))?;
        self.show_preview(file, &markdown);
        Ok(markdown)
    }

    fn show_preview(&self, file: &VaultFile, markdown: &str) {
        if let Some(preview) = &self.preview {
            preview.show(file.basename(), markdown);
        }
    }

    /// Write the converted note, overwriting an earlier conversion
    pub async fn save_markdown(
        &self,
        file: &VaultFile,
        markdown: &str,
        converted_at: DateTime<Utc>,
    ) -> Result<String> {
        let path = markdown_output_path(file, &self.settings);
        let content = format!("{}{}", frontmatter(file, converted_at), markdown);

        let folder = output_folder(&self.settings);
        if !folder.is_empty() && !self.vault.exists(&path).await {
            let folder = folder.trim_end_matches('/');
            if let Err(e) = self.vault.create_folder(folder).await {
                log::debug!("Output folder {} not created: {:#}", folder, e);
            }
        }

        self.vault
            .write(&path, &content)
            .await
            .with_context(|| format!("Failed to save converted note: {}", path))?;
        log::debug!("Saved {} as {}", file.path, path);
        Ok(path)
    }

    /// Convert every supported file in the vault, one after another
    pub async fn batch_convert(&self) -> Result<BatchReport> {
        let files: Vec<VaultFile> = self
            .vault
            .list_files()
            .await?
            .into_iter()
            .filter(|file| is_supported_extension(file.extension()))
            .collect();

        let mut report = BatchReport::default();
        if files.is_empty() {
            log::info!("No office documents found in the vault");
            return Ok(report);
        }

        log::info!("Batch converting {} files", files.len());
        for file in &files {
            match self.convert_file_for_batch(file).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    report.failed += 1;
                    log::error!("Converting {} failed: {:#}", file.name(), e);
                }
            }
        }

        log::info!(
            "Batch conversion finished: {} succeeded, {} failed",
            report.succeeded,
            report.failed
        );
        Ok(report)
    }

    async fn convert_file_for_batch(&self, file: &VaultFile) -> Result<()> {
        let markdown = self.convert(file).await.into_markdown()?;
        if self.settings.save_markdown {
            self.save_markdown(file, &markdown, Utc::now()).await?;
        }
        Ok(())
    }

    /// React to a new file: after the configured delay, convert it in the background.
    /// Returns `None` when auto-conversion is off or the file is not an office document.
    pub fn on_file_created(self: &Arc<Self>, file: VaultFile) -> Option<JoinHandle<()>> {
        if !self.settings.auto_convert || !is_supported_extension(file.extension()) {
            return None;
        }

        let service = Arc::clone(self);
        let delay = Duration::from_millis(self.settings.auto_convert_delay_ms);
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = service.convert_and_handle(&file).await {
                log::error!("Automatic conversion of {} failed: {:#}", file.path, e);
            }
        }))
    }
}

/// Vault backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl Vault for FsVault {
    async fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path))
            .await
            .with_context(|| format!("Failed to read {}", path))
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create folder for {}", path))?;
        }
        tokio::fs::write(&target, content)
            .await
            .with_context(|| format!("Failed to write {}", path))
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.resolve(path))
            .await
            .with_context(|| format!("Failed to create folder {}", path))
    }

    async fn list_files(&self) -> Result<Vec<VaultFile>> {
        let mut files = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to list {}", dir.display()))?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') {
                    continue;
                }
                let relative = if prefix.is_empty() {
                    name
                } else {
                    format!("{}/{}", prefix, name)
                };

                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push((entry.path(), relative));
                } else if file_type.is_file() {
                    files.push(VaultFile::new(relative));
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

/// Preview sink that only logs what would be shown
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPreview;

impl PreviewSink for LogPreview {
    fn show(&self, title: &str, markdown: &str) {
        log::info!("Preview '{}' ({} chars)", title, markdown.chars().count());
    }
}
