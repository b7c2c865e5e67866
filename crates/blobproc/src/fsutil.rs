//! Filesystem helpers for atomic file placement.
//!
//! `/tmp` and the spool regularly live on different filesystems, where a
//! plain rename fails with `EXDEV`. Both helpers therefore stage a
//! temporary file in the destination directory and only ever rename
//! within that directory, which keeps the final step atomic.

use std::fs;
use std::io;
use std::path::Path;

/// Copy `src` to `dst` atomically. The destination is written with mode
/// 0644 via a temporary sibling and renamed into place.
pub fn copy_file(dst: &Path, src: &Path) -> io::Result<()> {
    let mut reader = fs::File::open(src)?;
    let dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-copy-")
        .tempfile_in(dir)?;
    io::copy(&mut reader, tmp.as_file_mut())?;
    set_mode(tmp.path(), 0o644)?;
    tmp.persist(dst).map_err(|err| err.error)?;
    Ok(())
}

/// Move `src` to `dst`, working across filesystem boundaries: copy into a
/// sibling temp in the destination directory, rename within that
/// directory, then unlink the source. The rename never crosses a device
/// boundary, so the destination appears atomically.
pub fn move_file(dst: &Path, src: &Path) -> io::Result<()> {
    let mut reader = fs::File::open(src)?;
    let dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-move-")
        .tempfile_in(dir)?;
    io::copy(&mut reader, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    set_mode(tmp.path(), 0o644)?;
    tmp.persist(dst).map_err(|err| err.error)?;
    // Destination is in place; only now drop the source.
    fs::remove_file(src)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_preserves_content() {
        let dir = TempDir::new().expect("temp dir");
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, b"some pdf bytes").expect("write source");

        copy_file(&dst, &src).expect("copy");

        assert_eq!(fs::read(&dst).expect("read dst"), b"some pdf bytes");
        assert!(src.exists(), "copy must leave the source in place");
    }

    #[test]
    fn move_removes_source() {
        let dir = TempDir::new().expect("temp dir");
        let sub = dir.path().join("aa").join("bb");
        fs::create_dir_all(&sub).expect("dest dirs");
        let src = dir.path().join("upload.tmp");
        let dst = sub.join("d30c707d53f3d16c530dd73d70a6ce7596a9");
        fs::write(&src, b"hello, world!").expect("write source");

        move_file(&dst, &src).expect("move");

        assert_eq!(fs::read(&dst).expect("read dst"), b"hello, world!");
        assert!(!src.exists(), "move must unlink the source");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dst).expect("stat dst").permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[test]
    fn move_overwrites_existing_destination() {
        let dir = TempDir::new().expect("temp dir");
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, b"new").expect("write source");
        fs::write(&dst, b"old").expect("write destination");

        move_file(&dst, &src).expect("move");

        assert_eq!(fs::read(&dst).expect("read dst"), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn copy_sets_default_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        fs::write(&src, b"content").expect("write source");

        copy_file(&dst, &src).expect("copy");

        let mode = fs::metadata(&dst).expect("stat dst").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
