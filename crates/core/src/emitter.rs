//! Output boundary: formatting and writing rendered modules.
//!
//! The generator never touches the file system itself. Hosts hand it an
//! [`Emitter`]; its errors come back to the caller unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::generate::RenderedModule;

/// Failures raised by an [`Emitter`].
#[derive(thiserror::Error, Debug)]
pub enum EmitError {
    /// The formatter rejected the module text.
    #[error("Failed to format {}: {reason}", path.display())]
    Format {
        /// Module being formatted
        path: PathBuf,
        /// Formatter message
        reason: String,
    },

    /// Creating a directory or writing a file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// Directory or file being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Host-supplied sink for generated modules.
pub trait Emitter {
    /// Format module text before it is written. Identity by default.
    fn format(&self, _path: &Path, text: String) -> Result<String, EmitError> {
        Ok(text)
    }

    /// Ensure `dir` exists.
    fn mkdir(&mut self, dir: &Path) -> Result<(), EmitError>;

    /// Write `contents` to `path`, replacing what was there.
    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), EmitError>;
}

/// Format and write every module under `out_dir`.
///
/// Stops at the first failure.
pub fn write_modules<E: Emitter + ?Sized>(
    emitter: &mut E,
    out_dir: &Path,
    modules: &[RenderedModule],
) -> Result<(), EmitError> {
    emitter.mkdir(out_dir)?;
    for module in modules {
        let path = out_dir.join(&module.file_name);
        let text = emitter.format(&path, module.text.clone())?;
        emitter.write_file(&path, &text)?;
        debug!(path = %path.display(), bytes = text.len(), "Wrote module");
    }
    Ok(())
}

/// Writes straight to the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsEmitter;

impl Emitter for FsEmitter {
    fn mkdir(&mut self, dir: &Path) -> Result<(), EmitError> {
        fs::create_dir_all(dir).map_err(|source| EmitError::Io {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), EmitError> {
        fs::write(path, contents).map_err(|source| EmitError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Keeps everything in memory. Useful for previews and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryEmitter {
    /// Directories requested so far
    pub dirs: BTreeSet<PathBuf>,
    /// Written files by path; a rewrite replaces the text
    pub files: BTreeMap<PathBuf, String>,
}

impl Emitter for MemoryEmitter {
    fn mkdir(&mut self, dir: &Path) -> Result<(), EmitError> {
        self.dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> Result<(), EmitError> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
