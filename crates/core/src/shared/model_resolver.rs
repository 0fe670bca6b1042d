use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to store model at {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Called as `(bytes_so_far, content_length)`; the length is 0 when the
/// server sends none.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Finds `name` in the user cache, then in `bundled_dir`, and downloads it
/// from `url` into the cache when neither has it.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url, bundled_dir, progress)
}

/// [`resolve`] against an explicit cache directory.
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let target = cache_dir.join(name);
    let found = std::iter::once(target.clone())
        .chain(bundled_dir.map(|dir| dir.join(name)))
        .find(|candidate| candidate.is_file());
    if let Some(path) = found {
        log::debug!("Using model at {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    fetch_into(url, &target, progress)?;
    Ok(target)
}

/// Per-user directory where downloaded models are kept.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    let base = if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::cache_dir()
    };
    base.map(|dir| dir.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Streams `url` into `dest`. Bytes land in a sibling `.part` file that only
/// takes the final name once the body has been read completely.
fn fetch_into(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);

    let partial = PartialFile::create(dest.with_extension("part"))?;
    let mut writer = BufWriter::new(partial.file()?);
    let mut reader = ProgressReader {
        inner: response,
        read: 0,
        total,
        progress,
    };
    io::copy(&mut reader, &mut writer).map_err(|e| partial.store_err(e))?;
    writer.flush().map_err(|e| partial.store_err(e))?;
    drop(writer);

    partial.commit(dest)
}

/// Reader adapter that reports the running byte count after every read.
struct ProgressReader<R> {
    inner: R,
    read: u64,
    total: u64,
    progress: Option<ProgressFn>,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.read += n as u64;
            if let Some(report) = &self.progress {
                report(self.read, self.total);
            }
        }
        Ok(n)
    }
}

/// A download target that is removed on drop unless committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn create(path: PathBuf) -> Result<Self, ModelResolveError> {
        File::create(&path).map_err(|source| ModelResolveError::Store {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            committed: false,
        })
    }

    fn file(&self) -> Result<File, ModelResolveError> {
        fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| self.store_err(e))
    }

    fn store_err(&self, source: io::Error) -> ModelResolveError {
        ModelResolveError::Store {
            path: self.path.clone(),
            source,
        }
    }

    fn commit(mut self, dest: &Path) -> Result<(), ModelResolveError> {
        fs::rename(&self.path, dest).map_err(|source| ModelResolveError::Store {
            path: dest.to_path_buf(),
            source,
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}
