//! Filesystem helpers for sandbox preparation and installation.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Recursively copy `src` into `dst`, skipping top-level entries whose file
/// name is in `exclude`. Symlinks are recreated rather than followed. Returns
/// the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[String]) -> io::Result<usize> {
  fs::create_dir_all(dst)?;
  let mut copied = 0;

  let walker = WalkDir::new(src).follow_links(false).into_iter().filter_entry(|e| {
    e.depth() != 1
      || !e
        .file_name()
        .to_str()
        .is_some_and(|name| exclude.iter().any(|x| x == name))
  });

  for entry in walker {
    let entry = entry.map_err(io::Error::other)?;
    let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    if rel.as_os_str().is_empty() {
      continue;
    }
    let target = dst.join(rel);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      fs::create_dir_all(&target)?;
    } else if file_type.is_symlink() {
      let link = fs::read_link(entry.path())?;
      symlink(&link, &target)?;
    } else if file_type.is_file() {
      fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Copy a single file to `dst`, creating parent directories, and set its mode.
pub fn install_file(src: &Path, dst: &Path, mode: u32) -> io::Result<()> {
  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::copy(src, dst)?;
  set_mode(dst, mode)
}

/// Write `contents` to `dst`, creating parent directories, and set its mode.
pub fn install_bytes(contents: &[u8], dst: &Path, mode: u32) -> io::Result<()> {
  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(dst, contents)?;
  set_mode(dst, mode)
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

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  if target.is_dir() {
    std::os::windows::fs::symlink_dir(target, link)
  } else {
    std::os::windows::fs::symlink_file(target, link)
  }
}
