use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("model {name} not found in {searched:?} and no download URL is configured")]
    NotFound { name: String, searched: Vec<PathBuf> },
}

/// Where to look for a model file.
#[derive(Clone, Debug, Default)]
pub struct ModelSource<'a> {
    pub name: &'a str,
    /// Directory checked first, e.g. `--models-dir`.
    pub models_dir: Option<&'a Path>,
    pub url: Option<&'a str>,
}

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicit models directory
/// 2. User cache directory (platform-specific)
/// 3. Download from URL to cache, when one is configured
pub fn resolve(source: &ModelSource<'_>) -> Result<PathBuf, ModelResolveError> {
    resolve_in(source, &model_cache_dir()?)
}

fn resolve_in(source: &ModelSource<'_>, cache_dir: &Path) -> Result<PathBuf, ModelResolveError> {
    let mut searched = Vec::new();

    if let Some(dir) = source.models_dir {
        let local = dir.join(source.name);
        if local.exists() {
            return Ok(local);
        }
        searched.push(dir.to_path_buf());
    }

    let cached_path = cache_dir.join(source.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }
    searched.push(cache_dir.to_path_buf());

    let Some(url) = source.url else {
        return Err(ModelResolveError::NotFound {
            name: source.name.to_string(),
            searched,
        });
    };

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", source.name);
    download(url, &cached_path)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/EyeContact/models/`
/// - Linux: `$XDG_CACHE_HOME/EyeContact/models/` or `~/.cache/EyeContact/models/`
/// - Windows: `%LOCALAPPDATA%/EyeContact/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("EyeContact").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("EyeContact").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path);

    // Clean up .part file on any error
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(url: &str, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;

    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err(temp_path))?;
        downloaded += n as u64;
    }
    log::debug!("Downloaded {downloaded}/{total} bytes from {url}");

    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))?;
    Ok(())
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> ModelResolveError {
    let path = path.to_path_buf();
    move |source| ModelResolveError::Write { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_models_dir_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let models = tmp.path().join("models");
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&models).unwrap();
        fs::create_dir_all(&cache).unwrap();
        fs::write(models.join("m.onnx"), b"local").unwrap();
        fs::write(cache.join("m.onnx"), b"cached").unwrap();

        let source = ModelSource {
            name: "m.onnx",
            models_dir: Some(&models),
            url: None,
        };
        assert_eq!(resolve_in(&source, &cache).unwrap(), models.join("m.onnx"));
    }

    #[test]
    fn test_falls_back_to_cache() {
        let tmp = TempDir::new().unwrap();
        let models = tmp.path().join("models");
        fs::write(tmp.path().join("m.onnx"), b"cached").unwrap();

        let source = ModelSource {
            name: "m.onnx",
            models_dir: Some(&models),
            url: None,
        };
        assert_eq!(
            resolve_in(&source, tmp.path()).unwrap(),
            tmp.path().join("m.onnx")
        );
    }

    #[test]
    fn test_missing_without_url_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let source = ModelSource {
            name: "absent.onnx",
            models_dir: None,
            url: None,
        };
        let err = resolve_in(&source, tmp.path()).unwrap_err();
        assert!(matches!(err, ModelResolveError::NotFound { .. }));
        assert!(err.to_string().contains("absent.onnx"));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("EyeContact"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
