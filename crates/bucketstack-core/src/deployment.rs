//! Asset deployment manifest.
//!
//! A [`DeploymentManifest`] binds a local directory to the bucket. The engine
//! syncs the directory on each apply: every file becomes an object under its
//! relative path, and objects absent from the directory are pruned.
//!
//! The manifest records an inventory of the directory and a content
//! fingerprint. Both are pure functions of the relative paths and file
//! bytes, so an unchanged directory yields an identical manifest and the
//! engine sees no drift.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use digest::Digest;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::error::ProvisionError;

/// Buffer size used when hashing asset files.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// One file of the asset directory, as it will be stored in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetObject {
    /// Object key (relative path with `/` separators).
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded MD5 of the content.
    pub md5: String,
}

/// Binding of a local asset source to the target bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentManifest {
    /// The asset directory as configured.
    pub source_path: PathBuf,
    /// Name of the destination bucket.
    pub destination_bucket: String,
    /// Remove objects that are not present in the source.
    pub prune: bool,
    /// Files found under the source, sorted by key.
    pub objects: Vec<AssetObject>,
    /// Hex-encoded SHA-256 over every `(key, SHA-256 of content)` pair.
    pub fingerprint: String,
}

impl DeploymentManifest {
    /// Total number of bytes to upload.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }
}

fn not_found(path: &Path, reason: impl Into<String>) -> ProvisionError {
    ProvisionError::AssetSourceNotFound {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Build the manifest for syncing `source_path` into `bucket_name`.
///
/// An empty directory is valid and produces an empty inventory.
///
/// # Errors
///
/// Returns [`ProvisionError::AssetSourceNotFound`] if `source_path` does not
/// exist, is not a directory, or any entry below it cannot be read.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use bucketstack_core::deployment::build_deployment_manifest;
///
/// let err = build_deployment_manifest(Path::new("./no/such/dir"), "acme-dev-assets-bucket");
/// assert!(err.is_err());
/// ```
pub fn build_deployment_manifest(
    source_path: &Path,
    bucket_name: &str,
) -> Result<DeploymentManifest, ProvisionError> {
    let metadata = fs::metadata(source_path).map_err(|e| not_found(source_path, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(not_found(source_path, "not a directory"));
    }

    let mut files = Vec::new();
    collect_files(source_path, source_path, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut fingerprint = Sha256::new();
    let mut objects = Vec::with_capacity(files.len());
    for (key, path) in files {
        let hashed = hash_file(&path)?;

        fingerprint.update(key.as_bytes());
        fingerprint.update([0u8]);
        fingerprint.update(hashed.sha256);

        objects.push(AssetObject {
            key,
            size: hashed.size,
            md5: hex::encode(hashed.md5),
        });
    }

    let manifest = DeploymentManifest {
        source_path: source_path.to_path_buf(),
        destination_bucket: bucket_name.to_owned(),
        prune: true,
        objects,
        fingerprint: hex::encode(fingerprint.finalize()),
    };

    debug!(
        source = %source_path.display(),
        bucket = %bucket_name,
        objects = manifest.objects.len(),
        bytes = manifest.total_size(),
        fingerprint = %manifest.fingerprint,
        "built deployment manifest"
    );
    Ok(manifest)
}

/// Digests of one asset file.
struct HashedFile {
    size: u64,
    md5: Vec<u8>,
    sha256: Vec<u8>,
}

/// Stream `path` through MD5 and SHA-256 in fixed-size chunks.
fn hash_file(path: &Path) -> Result<HashedFile, ProvisionError> {
    let mut file = File::open(path).map_err(|e| not_found(path, e.to_string()))?;
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(not_found(path, e.to_string())),
        };
        md5.update(&buf[..n]);
        sha256.update(&buf[..n]);
        size += n as u64;
    }

    Ok(HashedFile {
        size,
        md5: md5.finalize().to_vec(),
        sha256: sha256.finalize().to_vec(),
    })
}

/// Recursively gather `(key, path)` for every file under `dir`.
///
/// Symbolic links are skipped, never followed.
fn collect_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<(String, PathBuf)>,
) -> Result<(), ProvisionError> {
    let entries = fs::read_dir(dir).map_err(|e| not_found(dir, e.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|e| not_found(dir, e.to_string()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| not_found(&path, e.to_string()))?;

        if file_type.is_symlink() {
            debug!(path = %path.display(), "skipping symbolic link in asset source");
        } else if file_type.is_dir() {
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            out.push((object_key(root, &path)?, path));
        }
    }
    Ok(())
}

fn object_key(root: &Path, path: &Path) -> Result<String, ProvisionError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| not_found(path, e.to_string()))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| not_found(path, "file name is not valid UTF-8"))?;
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET: &str = "acme-dev-assets-bucket";

    #[test]
    fn test_should_fail_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = build_deployment_manifest(&missing, BUCKET).unwrap_err();
        match err {
            ProvisionError::AssetSourceNotFound { path, .. } => {
                assert!(path.ends_with("nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_should_fail_for_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "<html></html>").unwrap();
        assert!(matches!(
            build_deployment_manifest(&file, BUCKET),
            Err(ProvisionError::AssetSourceNotFound { .. })
        ));
    }

    #[test]
    fn test_should_accept_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        assert_eq!(manifest.source_path, dir.path());
        assert_eq!(manifest.destination_bucket, BUCKET);
        assert!(manifest.prune);
        assert!(manifest.objects.is_empty());
        assert_eq!(manifest.total_size(), 0);
    }

    #[test]
    fn test_should_inventory_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("index.html"), "hello").unwrap();
        fs::write(dir.path().join("css/site.css"), "body{}").unwrap();

        let manifest = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        let keys: Vec<_> = manifest.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["css/site.css", "index.html"]);
        assert_eq!(manifest.objects[1].size, 5);
        // md5("hello")
        assert_eq!(manifest.objects[1].md5, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(manifest.total_size(), 11);
    }

    #[test]
    fn test_should_produce_identical_manifest_for_unchanged_assets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "hello").unwrap();

        let first = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        let second = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_should_change_fingerprint_when_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "v1").unwrap();
        let before = build_deployment_manifest(dir.path(), BUCKET).unwrap();

        fs::write(&file, "v2").unwrap();
        let after = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        assert_ne!(before.fingerprint, after.fingerprint);
    }

    #[test]
    fn test_should_change_fingerprint_when_file_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "same").unwrap();
        let before = build_deployment_manifest(dir.path(), BUCKET).unwrap();

        fs::rename(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
        let after = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        assert_ne!(before.fingerprint, after.fingerprint);
    }

    #[test]
    fn test_should_hash_files_larger_than_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![b'a'; READ_CHUNK_SIZE * 2 + 17];
        fs::write(dir.path().join("big.bin"), &content).unwrap();

        let manifest = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        assert_eq!(manifest.objects[0].size, content.len() as u64);
        assert_eq!(manifest.objects[0].md5, hex::encode(Md5::digest(&content)));
    }

    #[cfg(unix)]
    #[test]
    fn test_should_skip_symlink_loop() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "hello").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("self")).unwrap();

        let manifest = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        let keys: Vec<_> = manifest.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["index.html"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_should_skip_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "hello").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let manifest = build_deployment_manifest(dir.path(), BUCKET).unwrap();
        assert_eq!(manifest.objects.len(), 1);
        assert_eq!(manifest.objects[0].key, "index.html");
    }
}
