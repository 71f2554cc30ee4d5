//! Transfer executor for copying and moving single files

use ferrobatch_types::{Candidate, Error, ErrorDetail, Result, TransferAction, TransferOutcome};
use filetime::FileTime;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Performs one copy or move per call and reports it as a [`TransferOutcome`]
///
/// Destinations are flattened: the file keeps its bare name and lands
/// directly in the destination folder, whatever sub-folder it came from.
///
/// With overwriting disabled an existing destination is never touched and
/// the attempt fails with [`Error::DestinationExists`], including when the
/// destination is the source file itself. With overwriting enabled a copy is
/// written to a temporary sibling first and renamed over the target, so the
/// old content is only replaced once the new content is complete.
///
/// Copies carry the source timestamps and permissions over, best effort.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl TransferExecutor {
    /// Create an executor
    pub fn new() -> Self {
        Self
    }

    /// Where `candidate` ends up inside `destination_folder`
    pub fn destination_for(candidate: &Candidate, destination_folder: &Path) -> Option<PathBuf> {
        candidate
            .path
            .file_name()
            .map(|name| destination_folder.join(name))
    }

    /// Transfer one file, capturing any failure in the outcome
    pub async fn transfer(
        &self,
        candidate: Candidate,
        destination_folder: &Path,
        action: TransferAction,
        overwrite_existing: bool,
    ) -> TransferOutcome {
        let start = Instant::now();

        let Some(destination) = Self::destination_for(&candidate, destination_folder) else {
            let detail = ErrorDetail::from(Error::other("Source path has no file name"))
                .with_source(candidate.path.clone())
                .with_action(action);
            return TransferOutcome::failure(
                candidate,
                destination_folder.to_path_buf(),
                action,
                detail,
                start.elapsed(),
            );
        };

        let result = match action {
            TransferAction::Copy => {
                self.copy_file(&candidate.path, &destination, overwrite_existing)
                    .await
            }
            TransferAction::Move => {
                self.move_file(&candidate.path, &destination, overwrite_existing)
                    .await
            }
        };

        match result {
            Ok(bytes) => {
                debug!(
                    action = %action,
                    source = %candidate.path.display(),
                    destination = %destination.display(),
                    bytes,
                    "Transferred file"
                );
                TransferOutcome::success(candidate, destination, action, bytes, start.elapsed())
            }
            Err(error) => {
                warn!(
                    action = %action,
                    source = %candidate.path.display(),
                    destination = %destination.display(),
                    error = %error,
                    "Transfer failed"
                );
                let detail = ErrorDetail::from(&error)
                    .with_source(candidate.path.clone())
                    .with_destination(destination.clone())
                    .with_action(action);
                TransferOutcome::failure(candidate, destination, action, detail, start.elapsed())
            }
        }
    }

    /// Copy `source` to `destination`, returning the bytes written
    pub async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        overwrite_existing: bool,
    ) -> Result<u64> {
        refuse_same_file(source, destination, overwrite_existing).await?;

        if overwrite_existing {
            self.copy_replacing(source, destination).await
        } else {
            self.copy_exclusive(source, destination).await
        }
    }

    /// Move `source` to `destination`, returning the bytes moved
    ///
    /// A rename is tried first. When that is not possible, for example across
    /// volumes, the file is copied and the source deleted afterwards.
    pub async fn move_file(
        &self,
        source: &Path,
        destination: &Path,
        overwrite_existing: bool,
    ) -> Result<u64> {
        refuse_same_file(source, destination, overwrite_existing).await?;

        // rename replaces silently on most platforms
        if !overwrite_existing && path_exists(destination).await? {
            return Err(Error::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        let size = fs::metadata(source)
            .await
            .map_err(|e| Error::from_io(&e, source))?
            .len();

        match fs::rename(source, destination).await {
            Ok(()) => Ok(size),
            Err(error)
                if matches!(
                    error.kind(),
                    ErrorKind::NotFound | ErrorKind::PermissionDenied
                ) =>
            {
                Err(rename_error(&error, source, destination).await)
            }
            Err(error) => {
                debug!(
                    "Rename {} -> {} failed ({}), falling back to copy and delete",
                    source.display(),
                    destination.display(),
                    error
                );
                self.relocate_by_copy(source, destination, overwrite_existing)
                    .await
            }
        }
    }

    /// Copy then delete the source
    ///
    /// If the delete fails the copy stays in place and the move is reported
    /// failed, naming both paths.
    async fn relocate_by_copy(
        &self,
        source: &Path,
        destination: &Path,
        overwrite_existing: bool,
    ) -> Result<u64> {
        let bytes = if overwrite_existing {
            self.copy_replacing(source, destination).await?
        } else {
            self.copy_exclusive(source, destination).await?
        };

        if let Err(error) = fs::remove_file(source).await {
            return Err(Error::Io {
                message: format!(
                    "copied to '{}' but could not remove source '{}': {}",
                    destination.display(),
                    source.display(),
                    error
                ),
            });
        }
        Ok(bytes)
    }

    /// Copy into a destination that must not exist yet
    async fn copy_exclusive(&self, source: &Path, destination: &Path) -> Result<u64> {
        let mut reader = open_source(source).await?;
        let bytes = write_new(&mut reader, destination, destination).await?;
        self.preserve_metadata(source, destination).await;
        Ok(bytes)
    }

    /// Copy through a temporary sibling renamed over the destination
    async fn copy_replacing(&self, source: &Path, destination: &Path) -> Result<u64> {
        let mut reader = open_source(source).await?;
        let temp = temp_sibling(destination);

        // the temporary file lives in the destination folder
        let bytes = write_new(&mut reader, &temp, destination).await?;
        self.preserve_metadata(source, &temp).await;

        if let Err(error) = fs::rename(&temp, destination).await {
            let _ = fs::remove_file(&temp).await;
            return Err(Error::from_io(&error, destination));
        }
        Ok(bytes)
    }

    async fn preserve_metadata(&self, source: &Path, destination: &Path) {
        if let Err(error) = copy_file_metadata(source, destination).await {
            warn!(
                "Failed to preserve metadata on {}: {}",
                destination.display(),
                error
            );
        }
    }
}

async fn open_source(source: &Path) -> Result<fs::File> {
    fs::File::open(source)
        .await
        .map_err(|e| Error::from_io(&e, source))
}

/// Create `target` exclusively and fill it from `reader`
///
/// Failures are reported against `reported`, and a partly written `target`
/// is removed.
async fn write_new(reader: &mut fs::File, target: &Path, reported: &Path) -> Result<u64> {
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .await
        .map_err(|e| Error::from_io(&e, reported))?;

    let copied = async {
        let bytes = tokio::io::copy(reader, &mut writer).await?;
        writer.flush().await?;
        Ok::<_, std::io::Error>(bytes)
    }
    .await;
    drop(writer);

    match copied {
        Ok(bytes) => Ok(bytes),
        Err(error) => {
            // the file is ours, created above
            let _ = fs::remove_file(target).await;
            Err(Error::from_io(&error, reported))
        }
    }
}

async fn copy_file_metadata(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source).await?;

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, accessed, modified)?;

    fs::set_permissions(destination, metadata.permissions()).await?;
    Ok(())
}

async fn path_exists(path: &Path) -> Result<bool> {
    fs::try_exists(path).await.map_err(|e| Error::from_io(&e, path))
}

/// Fail when `destination` is `source` itself
///
/// Without overwriting this is just an existing destination.
async fn refuse_same_file(
    source: &Path,
    destination: &Path,
    overwrite_existing: bool,
) -> Result<()> {
    if !is_same_file(source, destination).await {
        return Ok(());
    }
    let path = destination.to_path_buf();
    Err(if overwrite_existing {
        Error::SameFile { path }
    } else {
        Error::DestinationExists { path }
    })
}

/// Both paths exist and resolve to the same file
async fn is_same_file(source: &Path, destination: &Path) -> bool {
    match (
        fs::canonicalize(source).await,
        fs::canonicalize(destination).await,
    ) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => false,
    }
}

/// Attribute a failed rename to the side that caused it
///
/// A rename needs the source entry plus write access to both folders.
async fn rename_error(error: &std::io::Error, source: &Path, destination: &Path) -> Error {
    let source_side = match error.kind() {
        ErrorKind::NotFound => !fs::try_exists(source).await.unwrap_or(true),
        _ => match source.parent() {
            Some(folder) => is_read_only(folder).await,
            None => false,
        },
    };

    let (path, message) = if source_side {
        (
            source.to_path_buf(),
            format!("cannot move to '{}': {}", destination.display(), error),
        )
    } else {
        (
            destination.to_path_buf(),
            format!("cannot move '{}' here: {}", source.display(), error),
        )
    };

    match error.kind() {
        ErrorKind::NotFound => Error::NotFound { path, message },
        _ => Error::PermissionDenied { path, message },
    }
}

async fn is_read_only(folder: &Path) -> bool {
    fs::metadata(folder)
        .await
        .map(|metadata| metadata.permissions().readonly())
        .unwrap_or(false)
}

fn temp_sibling(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.{}.partial", name, Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use ferrobatch_types::ErrorKind as FailureKind;
    use rstest::rstest;
    use std::fs as stdfs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source_folder: PathBuf,
        destination_folder: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source_folder = dir.path().join("in");
        let destination_folder = dir.path().join("out");
        stdfs::create_dir(&source_folder).unwrap();
        stdfs::create_dir(&destination_folder).unwrap();
        Fixture {
            _dir: dir,
            source_folder,
            destination_folder,
        }
    }

    fn candidate(folder: &Path, name: &str, content: &str) -> Candidate {
        let path = folder.join(name);
        stdfs::write(&path, content).unwrap();
        Candidate::new(path, Local::now())
    }

    #[tokio::test]
    async fn test_copy_new_file() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "hello");

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Copy, false)
            .await;

        assert!(outcome.succeeded);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.bytes_transferred, 5);
        assert_eq!(outcome.destination, fx.destination_folder.join("report.xlsx"));
        assert_eq!(stdfs::read_to_string(&outcome.destination).unwrap(), "hello");
        assert!(fx.source_folder.join("report.xlsx").exists());
    }

    #[tokio::test]
    async fn test_copy_refuses_existing_destination() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "new");
        stdfs::write(fx.destination_folder.join("report.xlsx"), "old").unwrap();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Copy, false)
            .await;

        assert!(!outcome.succeeded);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, FailureKind::DestinationExists);
        assert_eq!(error.action, Some(TransferAction::Copy));
        assert_eq!(
            stdfs::read_to_string(fx.destination_folder.join("report.xlsx")).unwrap(),
            "old"
        );
    }

    #[tokio::test]
    async fn test_copy_overwrites_when_enabled() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "new");
        stdfs::write(fx.destination_folder.join("report.xlsx"), "old content").unwrap();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Copy, true)
            .await;

        assert!(outcome.succeeded);
        assert_eq!(
            stdfs::read_to_string(fx.destination_folder.join("report.xlsx")).unwrap(),
            "new"
        );
        // no temporary files left behind
        assert_eq!(stdfs::read_dir(&fx.destination_folder).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_copy_preserves_modification_time() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "old.txt", "data");
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&candidate.path, mtime).unwrap();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Copy, false)
            .await;

        let metadata = stdfs::metadata(&outcome.destination).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&metadata), mtime);
    }

    #[tokio::test]
    async fn test_move_removes_source() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "payload");
        let source = candidate.path.clone();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Move, false)
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.bytes_transferred, 7);
        assert!(!source.exists());
        assert_eq!(stdfs::read_to_string(&outcome.destination).unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_move_refuses_existing_destination() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "new");
        let source = candidate.path.clone();
        stdfs::write(fx.destination_folder.join("report.xlsx"), "old").unwrap();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Move, false)
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.unwrap().kind, FailureKind::DestinationExists);
        assert!(source.exists());
        assert_eq!(
            stdfs::read_to_string(fx.destination_folder.join("report.xlsx")).unwrap(),
            "old"
        );
    }

    #[tokio::test]
    async fn test_move_overwrites_when_enabled() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "new");
        stdfs::write(fx.destination_folder.join("report.xlsx"), "old").unwrap();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Move, true)
            .await;

        assert!(outcome.succeeded);
        assert_eq!(
            stdfs::read_to_string(fx.destination_folder.join("report.xlsx")).unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_same_file_is_rejected() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "self.txt", "x");

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.source_folder, TransferAction::Copy, true)
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.unwrap().kind, FailureKind::SameFile);
        assert_eq!(
            stdfs::read_to_string(fx.source_folder.join("self.txt")).unwrap(),
            "x"
        );
    }

    #[tokio::test]
    async fn test_vanished_source_is_not_found() {
        let fx = fixture();
        let candidate = Candidate::new(fx.source_folder.join("gone.txt"), Local::now());

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Copy, false)
            .await;

        assert!(!outcome.succeeded);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, FailureKind::NotFound);
        assert_eq!(error.source_path, Some(fx.source_folder.join("gone.txt")));
        assert_eq!(
            error.destination_path,
            Some(fx.destination_folder.join("gone.txt"))
        );
    }

    #[tokio::test]
    async fn test_missing_destination_folder_fails_file() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "a.txt", "a");

        let outcome = TransferExecutor::new()
            .transfer(
                candidate,
                &fx.destination_folder.join("missing"),
                TransferAction::Copy,
                false,
            )
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.error.unwrap().scope(), ferrobatch_types::ErrorScope::File);
    }

    #[rstest]
    #[case(TransferAction::Copy)]
    #[case(TransferAction::Move)]
    #[tokio::test]
    async fn test_own_folder_without_overwrite_is_existing_destination(
        #[case] action: TransferAction,
    ) {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "self.txt", "x");

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.source_folder, action, false)
            .await;

        assert!(!outcome.succeeded);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, FailureKind::DestinationExists);
        assert_eq!(error.destination_path, Some(fx.source_folder.join("self.txt")));
        assert_eq!(
            stdfs::read_to_string(fx.source_folder.join("self.txt")).unwrap(),
            "x"
        );
    }

    #[tokio::test]
    async fn test_replacing_copy_into_missing_folder_names_destination() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "a.txt", "a");
        let folder = fx.destination_folder.join("missing");

        let outcome = TransferExecutor::new()
            .transfer(candidate, &folder, TransferAction::Copy, true)
            .await;

        assert!(!outcome.succeeded);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, FailureKind::NotFound);
        let expected = format!("File not found: {}: ", folder.join("a.txt").display());
        assert!(
            error.message.starts_with(&expected),
            "unexpected message: {}",
            error.message
        );
        assert!(error.message.len() > expected.len());
    }

    #[tokio::test]
    async fn test_replacing_copy_removes_temporary_file_on_failure() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "report.xlsx", "new");
        // a folder cannot be replaced by a file
        stdfs::create_dir(fx.destination_folder.join("report.xlsx")).unwrap();

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Copy, true)
            .await;

        assert!(!outcome.succeeded);
        let left: Vec<_> = stdfs::read_dir(&fx.destination_folder)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("report.xlsx")]);
        assert!(fx.destination_folder.join("report.xlsx").is_dir());
        assert_eq!(
            stdfs::read_to_string(fx.source_folder.join("report.xlsx")).unwrap(),
            "new"
        );
    }

    /// Make `folder` read-only; false when the current user can write anyway
    #[cfg(unix)]
    fn lock_folder(folder: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        stdfs::set_permissions(folder, stdfs::Permissions::from_mode(0o555)).unwrap();
        let check = folder.join(".write-check");
        if stdfs::write(&check, b"").is_ok() {
            let _ = stdfs::remove_file(&check);
            unlock_folder(folder);
            return false;
        }
        true
    }

    #[cfg(unix)]
    fn unlock_folder(folder: &Path) {
        use std::os::unix::fs::PermissionsExt;
        stdfs::set_permissions(folder, stdfs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_fallback_reports_undeletable_source() {
        let fx = fixture();
        let source = candidate(&fx.source_folder, "a.txt", "payload").path;
        let destination = fx.destination_folder.join("a.txt");
        if !lock_folder(&fx.source_folder) {
            return;
        }

        let result = TransferExecutor::new()
            .relocate_by_copy(&source, &destination, false)
            .await;
        unlock_folder(&fx.source_folder);

        let error = result.unwrap_err();
        assert_eq!(error.kind(), FailureKind::Io);
        let message = error.to_string();
        assert!(message.contains(&destination.display().to_string()));
        assert!(message.contains(&source.display().to_string()));
        assert_eq!(stdfs::read_to_string(&destination).unwrap(), "payload");
        assert!(source.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_move_from_read_only_folder_blames_source() {
        let fx = fixture();
        let candidate = candidate(&fx.source_folder, "a.txt", "payload");
        let source = candidate.path.clone();
        if !lock_folder(&fx.source_folder) {
            return;
        }

        let outcome = TransferExecutor::new()
            .transfer(candidate, &fx.destination_folder, TransferAction::Move, false)
            .await;
        unlock_folder(&fx.source_folder);

        assert!(!outcome.succeeded);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, FailureKind::PermissionDenied);
        assert!(error
            .message
            .starts_with(&format!("Permission denied: {}:", source.display())));
        assert!(source.exists());
        assert!(!fx.destination_folder.join("a.txt").exists());
    }
}
