//! External PDF engine behind a narrow adapter trait.
//!
//! The orchestrator only sees [`PdfEngine`]; the production implementation
//! drives headless LibreOffice. The engine binary plus an isolated user
//! profile directory are acquired once per run and reused for every record:
//! soffice instances sharing a profile trip over each other's lock files, and
//! profile creation dominates cold-start time.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::debug;
use tempfile::TempDir;

use super::{EngineError, RenderError};

pub trait PdfEngine {
    /// Export `document` as a PDF into `output_dir`, returning the PDF path.
    fn export_pdf(&self, document: &Path, output_dir: &Path) -> Result<PathBuf, RenderError>;
}

/// Headless LibreOffice. The profile directory is a scoped resource: dropped
/// (and deleted) on every exit path of the run that acquired it.
pub struct SofficeEngine {
    binary: PathBuf,
    profile_dir: TempDir,
    timeout: Duration,
}

impl SofficeEngine {
    pub fn acquire(explicit_path: Option<&Path>, timeout: Duration) -> Result<Self, EngineError> {
        let binary = match explicit_path {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(_) | None => find_soffice().ok_or(EngineError::NotFound)?,
        };
        let profile_dir = tempfile::tempdir().map_err(EngineError::Profile)?;
        debug!(
            "acquired soffice at {} with profile {}",
            binary.display(),
            profile_dir.path().display()
        );

        Ok(Self {
            binary,
            profile_dir,
            timeout,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl PdfEngine for SofficeEngine {
    fn export_pdf(&self, document: &Path, output_dir: &Path) -> Result<PathBuf, RenderError> {
        let mut child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--norestore")
            .arg(format!(
                "-env:UserInstallation=file://{}",
                self.profile_dir.path().display()
            ))
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(output_dir)
            .arg(document)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RenderError::EngineIo)?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait().map_err(RenderError::EngineIo)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RenderError::Timeout(self.timeout.as_secs()));
                }
                None => std::thread::sleep(Duration::from_millis(100)),
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(RenderError::EngineExit {
                status: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        let stem = document
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let pdf_path = output_dir.join(format!("{stem}.pdf"));
        if !pdf_path.exists() {
            return Err(RenderError::MissingOutput(pdf_path));
        }

        Ok(pdf_path)
    }
}

/// Look for the engine binary: `PATH` first, then well-known locations.
fn find_soffice() -> Option<PathBuf> {
    for name in ["soffice", "libreoffice"] {
        if let Some(path) = search_path(name) {
            return Some(path);
        }
    }

    const CANDIDATES: [&str; 4] = [
        "/usr/bin/soffice",
        "/usr/bin/libreoffice",
        "/usr/local/bin/soffice",
        "/Applications/LibreOffice.app/Contents/MacOS/soffice",
    ];
    CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

fn search_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
