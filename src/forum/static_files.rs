//! Static file serving for the catch-all route.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Serves files below a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Map a URL path onto the filesystem.
    ///
    /// The path is percent-decoded (kept raw if that fails), any query is
    /// dropped and `.`/`..` segments are resolved without climbing above the
    /// root. Anything that still lands outside the root maps to the root.
    pub fn resolve(&self, url_path: &str) -> PathBuf {
        let decoded: Cow<'_, str> = percent_encoding::percent_decode_str(url_path)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(url_path));
        let without_query = decoded.split('?').next().unwrap_or_default();

        let mut segments: Vec<&std::ffi::OsStr> = Vec::new();
        for component in Path::new(without_query).components() {
            match component {
                Component::Normal(segment) => segments.push(segment),
                Component::ParentDir => {
                    segments.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let path: PathBuf = segments.iter().fold(self.root.clone(), |mut path, segment| {
            path.push(segment);
            path
        });

        if path.starts_with(&self.root) {
            path
        } else {
            self.root.clone()
        }
    }

    /// Read the file for `url_path` with its guessed content type.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, String)> {
        let path = self.resolve(url_path);
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, content_type(&path)))
    }
}

pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img").join("a b.txt"), "spaced").unwrap();
        let files = StaticFiles::new(dir.path());
        (dir, files)
    }

    #[test]
    fn test_serves_file_with_guessed_type() {
        let (_dir, files) = site();
        let (bytes, ct) = files.load("/style.css").unwrap();
        assert_eq!(bytes, b"body {}");
        assert_eq!(ct, "text/css");
    }

    #[test]
    fn test_percent_decodes_path() {
        let (_dir, files) = site();
        let (bytes, _) = files.load("/img/a%20b.txt").unwrap();
        assert_eq!(bytes, b"spaced");
    }

    #[test]
    fn test_parent_segments_stay_inside_root() {
        let (dir, files) = site();
        assert_eq!(files.resolve("/../../etc/passwd"), dir.path().join("etc").join("passwd"));
        assert_eq!(files.resolve("/img/../style.css"), dir.path().join("style.css"));
        assert!(files.load("/../../etc/passwd").is_err());
    }

    #[test]
    fn test_directory_and_missing_file_are_not_found() {
        let (_dir, files) = site();
        assert!(files.load("/").is_err());
        assert!(files.load("/img").is_err());
        assert!(files.load("/missing.js").is_err());
    }

    #[test]
    fn test_query_is_ignored() {
        let (_dir, files) = site();
        assert!(files.load("/style.css%3Fv=2").is_ok());
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type(Path::new("update.js")), "text/javascript");
        assert_eq!(content_type(Path::new("blob.unknownext")), "application/octet-stream");
    }
}
