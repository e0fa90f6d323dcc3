//! Template artifact lifetime in the working directory
//!
//! The store owns every file of the template extension inside its working
//! directory for the duration of a run. It reuses a valid template already on
//! disk, otherwise clears out leftovers, triggers a fresh download and polls
//! for the finished file. Clearing and persisting replace the same path, so
//! both passes of a run share one physical file. Every rewrite goes through a
//! sibling `.saving` file that is renamed over the artifact, so an interrupted
//! write never leaves a truncated template behind.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tokio::fs;

use shared::{run_debug, run_info, run_warn, RunId};

use crate::config::{TemplateConfig, Timings};
use crate::core::template::{TemplateFormat, TemplateTable};
use crate::error::{WorkflowError, WorkflowResult};

/// Suffix of the scratch file a rewrite goes through
pub const SAVING_SUFFIX: &str = ".saving";

/// A template ready for reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredTemplate {
    pub path: PathBuf,
    pub table: TemplateTable,
    /// True when an artifact already on disk was used
    pub reused: bool,
}

pub struct TemplateStore {
    run_id: RunId,
    work_dir: PathBuf,
    extension: String,
    format: TemplateFormat,
    partial_suffix: String,
    poll_interval: Duration,
    download_timeout: Duration,
}

impl TemplateStore {
    pub fn new(run_id: RunId, work_dir: PathBuf, template: &TemplateConfig, timings: &Timings) -> Self {
        Self {
            run_id,
            work_dir,
            extension: template.extension.trim_start_matches('.').to_string(),
            format: TemplateFormat::from_extension(&template.extension),
            partial_suffix: template.partial_suffix.clone(),
            poll_interval: timings.download_poll_interval,
            download_timeout: timings.download_timeout,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub async fn ensure_work_dir(&self) -> WorkflowResult<()> {
        fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| WorkflowError::artifact_io("create working directory", &self.work_dir, e))
    }

    /// Finished artifact: managed extension, not an in-flight download
    fn is_artifact(&self, file_name: &str) -> bool {
        !file_name.ends_with(&self.partial_suffix) && file_name.ends_with(&format!(".{}", self.extension))
    }

    /// In-flight download or an interrupted rewrite
    fn is_partial(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.partial_suffix) || file_name.ends_with(SAVING_SUFFIX)
    }

    /// Artifacts in the working directory, newest first
    pub async fn list_artifacts(&self) -> WorkflowResult<Vec<PathBuf>> {
        let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut entries = fs::read_dir(&self.work_dir)
            .await
            .map_err(|e| WorkflowError::artifact_io("list", &self.work_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WorkflowError::artifact_io("list", &self.work_dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.is_artifact(&name) {
                continue;
            }
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| WorkflowError::artifact_io("stat", &entry.path(), e))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, entry.path()));
        }

        // Newest first; ties broken by name for a stable order
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete every artifact and partial download so a poll cannot see a leftover
    pub async fn remove_stale(&self) -> WorkflowResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.work_dir)
            .await
            .map_err(|e| WorkflowError::artifact_io("list", &self.work_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WorkflowError::artifact_io("list", &self.work_dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if self.is_artifact(&name) || self.is_partial(&name) {
                self.remove(&entry.path()).await?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn remove(&self, path: &Path) -> WorkflowResult<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| WorkflowError::artifact_io("remove", path, e))?;
        run_debug!(self.run_id, "🗑️ Removed file: {}", path.display());
        Ok(())
    }

    /// Newest artifact that decodes to a usable table; older duplicates are removed
    ///
    /// An artifact that does not decode, lacks a required column or has no
    /// item rows is treated as stale and deleted along with everything else,
    /// so the caller falls back to a download.
    pub async fn find_reusable(&self) -> WorkflowResult<Option<AcquiredTemplate>> {
        let artifacts = self.list_artifacts().await?;
        let Some((newest, older)) = artifacts.split_first() else {
            return Ok(None);
        };

        let table = match self.load(newest).await {
            Ok(table) => table,
            Err(e) => {
                run_warn!(
                    self.run_id,
                    "⚠️ Existing template {} is not usable ({}), downloading a fresh one",
                    newest.display(),
                    e
                );
                self.remove_stale().await?;
                return Ok(None);
            }
        };

        for path in older {
            self.remove(path).await?;
        }
        Ok(Some(AcquiredTemplate {
            path: newest.clone(),
            table,
            reused: true,
        }))
    }

    /// Poll the working directory until a finished artifact appears
    pub async fn wait_for_download(&self) -> WorkflowResult<PathBuf> {
        run_debug!(self.run_id, "Waiting for download to complete...");
        let started = Instant::now();

        loop {
            if let Some(path) = self.list_artifacts().await?.into_iter().next() {
                return Ok(path);
            }
            if started.elapsed() >= self.download_timeout {
                return Err(WorkflowError::DownloadTimeout {
                    dir: self.work_dir.clone(),
                    waited: self.download_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Reuse a valid template on disk, otherwise run `download` and wait for the file
    pub async fn acquire_or_reuse<F, Fut>(&self, download: F) -> WorkflowResult<AcquiredTemplate>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = WorkflowResult<()>>,
    {
        self.ensure_work_dir().await?;

        if let Some(existing) = self.find_reusable().await? {
            run_info!(self.run_id, "Using existing template file {}", existing.path.display());
            return Ok(existing);
        }

        let removed = self.remove_stale().await?;
        if removed > 0 {
            run_debug!(self.run_id, "Removed {} stale files before download", removed);
        }

        download().await?;
        let path = self.wait_for_download().await?;
        let table = self.load(&path).await?;
        run_info!(
            self.run_id,
            "Downloaded new template file {} ({} rows)",
            path.display(),
            table.rows.len()
        );

        Ok(AcquiredTemplate {
            path,
            table,
            reused: false,
        })
    }

    /// Read and decode an artifact; a template without item rows is an error
    pub async fn load(&self, path: &Path) -> WorkflowResult<TemplateTable> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| WorkflowError::artifact_io("read", path, e))?;
        let table = TemplateTable::decode(self.format, &bytes).map_err(|e| WorkflowError::template("parse", path, e))?;
        if table.rows.is_empty() {
            return Err(WorkflowError::EmptyTemplate {
                path: path.to_path_buf(),
            });
        }
        Ok(table)
    }

    /// Blank quantity and price on every row and rewrite the file in place
    pub async fn clear(&self, path: &Path) -> WorkflowResult<TemplateTable> {
        let mut table = self.load(path).await?;
        table.clear();
        self.persist(&table, path).await?;
        run_debug!(self.run_id, "Cleared quantity and price columns in {}", path.display());
        Ok(table)
    }

    pub async fn persist(&self, table: &TemplateTable, path: &Path) -> WorkflowResult<()> {
        let bytes = table.to_bytes().map_err(|e| WorkflowError::template("write", path, e))?;

        let mut scratch = path.as_os_str().to_owned();
        scratch.push(SAVING_SUFFIX);
        let scratch = PathBuf::from(scratch);

        fs::write(&scratch, bytes)
            .await
            .map_err(|e| WorkflowError::artifact_io("write", &scratch, e))?;
        fs::rename(&scratch, path)
            .await
            .map_err(|e| WorkflowError::artifact_io("replace", path, e))?;
        run_debug!(self.run_id, "💾 Saved template file {}", path.display());
        Ok(())
    }
}
