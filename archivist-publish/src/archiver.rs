//! Pruning processed inputs once their records are safely published.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ArchivalError;

/// Removes published input files and records the removal.
pub trait Archiver {
    fn archive(&self, files: &[PathBuf]) -> Result<(), ArchivalError>;

    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// Plain removal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RemoveArchiver;

impl Archiver for RemoveArchiver {
    fn archive(&self, files: &[PathBuf]) -> Result<(), ArchivalError> {
        for file in files {
            match std::fs::remove_file(file) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ArchivalError::Io {
                        path: file.clone(),
                        source,
                    })
                }
            }
        }
        tracing::info!("removed {} processed files", files.len());
        Ok(())
    }

    fn describe(&self) -> String {
        "remove".to_string()
    }
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// `git rm -f`, `git commit`, and optionally `git push` inside `repo_dir`.
#[derive(Debug, Clone)]
pub struct GitArchiver {
    pub repo_dir: PathBuf,
    pub message: String,
    pub push: bool,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl GitArchiver {
    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_dir);
        if let Some(name) = &self.user_name {
            cmd.arg("-c").arg(format!("user.name={name}"));
        }
        if let Some(email) = &self.user_email {
            cmd.arg("-c").arg(format!("user.email={email}"));
        }
        cmd
    }

    fn run(&self, step: &str, mut cmd: Command) -> Result<(), ArchivalError> {
        let output = cmd.output().map_err(|source| ArchivalError::Spawn {
            path: self.repo_dir.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ArchivalError::Git {
                step: step.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::debug!("git {step} ok");
        Ok(())
    }

    fn relative<'a>(&self, file: &'a Path) -> &'a Path {
        file.strip_prefix(&self.repo_dir).unwrap_or(file)
    }
}

impl Archiver for GitArchiver {
    fn archive(&self, files: &[PathBuf]) -> Result<(), ArchivalError> {
        if files.is_empty() {
            return Ok(());
        }

        let mut rm = self.git();
        rm.args(["rm", "-f", "--quiet", "--"]);
        rm.args(files.iter().map(|f| self.relative(f)));
        self.run("rm", rm)?;

        let mut commit = self.git();
        commit.args(["commit", "--quiet", "-m", self.message.as_str()]);
        self.run("commit", commit)?;

        if self.push {
            let mut push = self.git();
            push.arg("push");
            self.run("push", push)?;
        }

        tracing::info!(
            "removed {} processed files via git in {}",
            files.len(),
            self.repo_dir.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("git ({})", self.repo_dir.display())
    }
}
