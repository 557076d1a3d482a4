//! Export helpers shared by the playlist and guide writers

use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{CatalogError, CatalogResult};
use crate::models::ProviderMap;

/// Intersect the user's provider selection with what is available
///
/// Keys come back in bucket order. Fails when nothing is selected or none
/// of the selected providers exist.
pub fn select_providers(buckets: &ProviderMap, selected: &[String]) -> CatalogResult<Vec<String>> {
    let selected: Vec<String> = selected.iter().map(|s| s.to_lowercase()).collect();
    if selected.is_empty() {
        return Err(CatalogError::no_providers());
    }

    let providers: Vec<String> = buckets
        .keys()
        .filter(|key| selected.contains(key))
        .cloned()
        .collect();

    if providers.is_empty() {
        return Err(CatalogError::no_providers());
    }

    Ok(providers)
}

/// Resolve a client-supplied export name inside `export_dir`
///
/// Only a bare file name is accepted: no separators, no `.`/`..`, nothing
/// absolute.
pub fn resolve_output(export_dir: &Path, output: &str) -> CatalogResult<PathBuf> {
    let output = output.trim();
    if output.is_empty() {
        return Err(CatalogError::Configuration("Output file name is required".to_string()));
    }

    let mut components = Path::new(output).components();
    let is_bare_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !is_bare_name || output.contains(['/', '\\']) {
        return Err(CatalogError::Configuration(format!(
            "Output must be a plain file name: {}",
            output
        )));
    }

    Ok(export_dir.join(output))
}

/// Buffered writer that only replaces the target on `finalize`
pub struct AtomicFileWriter {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl AtomicFileWriter {
    pub async fn create(final_path: &Path) -> std::io::Result<Self> {
        let file_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "export".to_string());
        let tmp_path = final_path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ));

        let file = File::create(&tmp_path).await?;
        Ok(Self {
            writer: BufWriter::with_capacity(64 * 1024, file), // 64KB buffer
            tmp_path,
            final_path: final_path.to_path_buf(),
        })
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(buf).await
    }

    /// Flush, sync and atomically rename over the target
    pub async fn finalize(mut self) -> std::io::Result<u64> {
        self.writer.flush().await?;
        self.writer.get_ref().sync_all().await?;
        let bytes = self.writer.get_ref().metadata().await?.len();
        drop(self.writer);

        if let Err(e) = fs::rename(&self.tmp_path, &self.final_path).await {
            let _ = fs::remove_file(&self.tmp_path).await;
            return Err(e);
        }

        Ok(bytes)
    }

    /// Remove the temp file without touching the target
    pub async fn abort(self) {
        drop(self.writer);
        let _ = fs::remove_file(&self.tmp_path).await;
    }
}

/// Render into memory, then replace `path` through a temp file
///
/// Nothing is created when `render` fails; the target is untouched on any
/// failure.
pub async fn write_export<F>(path: &Path, render: F) -> CatalogResult<u64>
where
    F: FnOnce(&mut Vec<u8>) -> CatalogResult<()>,
{
    let mut body = Vec::new();
    render(&mut body)?;

    let mut file = AtomicFileWriter::create(path).await?;
    if let Err(e) = file.write_all(&body).await {
        file.abort().await;
        return Err(e.into());
    }

    Ok(file.finalize().await?)
}
