//! Config-driven construction of the collaborators.

use archivist_core::{ArchiverConfig, PipelineConfig, PublishConfig, SourceConfig};

use crate::archiver::{Archiver, GitArchiver, RemoveArchiver};
use crate::error::UploadError;
use crate::fetch::{ArchiveSource, DirectorySource, HttpSource, NoArchiveSource};
use crate::upload::{DirectoryUploader, HttpUploader, Uploader};

/// Expects a resolved config (see `PipelineConfig::resolve`).
pub fn source_for(config: &PipelineConfig) -> Box<dyn ArchiveSource> {
    match &config.source {
        SourceConfig::None => Box::new(NoArchiveSource),
        SourceConfig::Directory { path } => {
            Box::new(DirectorySource::new(path, &config.output_file_name))
        }
        SourceConfig::Http { url } => Box::new(HttpSource::new(url, &config.output_file_name)),
    }
}

/// Fails when an HTTP publisher names a token variable that is not set.
pub fn uploader_for(config: &PipelineConfig) -> Result<Box<dyn Uploader>, UploadError> {
    match &config.publish {
        PublishConfig::Directory { path } => Ok(Box::new(DirectoryUploader::new(path))),
        PublishConfig::Http {
            endpoint,
            token_env,
        } => {
            let token = match token_env {
                Some(var) => Some(
                    std::env::var(var).map_err(|_| UploadError::MissingToken(var.clone()))?,
                ),
                None => None,
            };
            Ok(Box::new(HttpUploader::new(endpoint, token)))
        }
    }
}

pub fn archiver_for(config: &PipelineConfig) -> Box<dyn Archiver> {
    match &config.archiver {
        ArchiverConfig::Remove => Box::new(RemoveArchiver),
        ArchiverConfig::Git {
            repo_dir,
            message,
            push,
            user_name,
            user_email,
        } => Box::new(GitArchiver {
            repo_dir: repo_dir
                .clone()
                .unwrap_or_else(|| config.input_dir.clone()),
            message: message.clone(),
            push: *push,
            user_name: user_name.clone(),
            user_email: user_email.clone(),
        }),
    }
}
