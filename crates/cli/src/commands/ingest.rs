//! Ingest command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::{KnowledgeBase, UploadedFile};
use std::path::{Path, PathBuf};

/// Add documents to the knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// PDF, DOCX or CSV files to ingest
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Ingesting {} files", self.files.len());

        let uploads = self
            .files
            .iter()
            .map(|path| read_upload(path))
            .collect::<AppResult<Vec<_>>>()?;

        let knowledge = KnowledgeBase::open(config).await?;
        let report = knowledge.ingest(uploads).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "✅ Processed {} file(s) → {} chunks embedded!",
                report.files, report.chunks
            );
        }

        Ok(())
    }
}

fn read_upload(path: &Path) -> AppResult<UploadedFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Config(format!("Not a file: {:?}", path)))?;

    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Ingest(format!("Failed to read {:?}: {}", path, e)))?;

    Ok(UploadedFile::new(name, bytes))
}
