use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Returns the length of the regular file at `path`, or None if there is none
pub async fn existing_len(path: &Path) -> Option<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        _ => None,
    }
}

/// Decides whether an existing file already satisfies a fetch
///
/// With an unknown expected size any non-empty file counts as complete. This
/// cannot detect a file truncated by an earlier crash; only a known expected
/// size catches that.
pub fn is_complete(existing_len: Option<u64>, expected_size: Option<u64>) -> bool {
    match (existing_len, expected_size) {
        (None, _) => false,
        (Some(len), None) => len > 0,
        (Some(len), Some(expected)) => len == expected,
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes `contents` to `path` atomically with owner-only permissions
///
/// The bytes go to a sibling `.part` file which is renamed over `path` once
/// fully written, so a crash never leaves a partial file under the final name.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let partial = partial_path(path);

    let result = async {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&partial).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&partial, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }
    result
}
