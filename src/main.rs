use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};

use office_markdown::config::{ConverterSettings, SETTINGS_FILE_NAME};
use office_markdown::logging::{init_logging, level_from_env};
use office_markdown::vault::{ConversionService, FsVault, LogPreview, VaultFile};
use office_markdown::Converter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(level_from_env())?;

    let mut args = std::env::args().skip(1);
    let Some(root) = args.next().map(PathBuf::from) else {
        bail!("usage: office-markdown <vault-dir> [file ...]");
    };
    let files: Vec<VaultFile> = args.map(VaultFile::new).collect();

    let settings = ConverterSettings::load(&root.join(SETTINGS_FILE_NAME)).await?;
    let service = ConversionService::new(FsVault::new(root), Converter::shared().await, settings)
        .with_preview(Arc::new(LogPreview));

    if files.is_empty() {
        let report = service.batch_convert().await?;
        if report.failed > 0 {
            bail!("{} of {} files failed to convert", report.failed, report.succeeded + report.failed);
        }
        return Ok(());
    }

    let mut failed = 0;
    for file in &files {
        if let Err(e) = service.convert_and_handle(file).await {
            log::error!("{:#}", e);
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{} of {} files failed to convert", failed, files.len());
    }
    Ok(())
}
