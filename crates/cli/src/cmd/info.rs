use std::path::Path;

use anyhow::Result;

use drvpipe_lib::platform::paths::store_dir;
use drvpipe_lib::platform::platform_triple;

use crate::output::{format_bytes, print_stat};

pub fn cmd_info() -> Result<()> {
  println!("drvpipe {}", env!("CARGO_PKG_VERSION"));
  match platform_triple() {
    Some(triple) => print_stat("Platform", &triple),
    None => print_stat("Platform", "unsupported"),
  }

  let store = store_dir();
  let build_dir = store.join("build");
  let published = std::fs::read_dir(&build_dir).map(|entries| entries.count()).unwrap_or(0);

  print_stat("Store", &store.display().to_string());
  print_stat("Published outputs", &published.to_string());
  print_stat("Store usage", &format_bytes(dir_size(&build_dir)));
  Ok(())
}

fn dir_size(path: &Path) -> u64 {
  if !path.exists() {
    return 0;
  }

  let mut size = 0;
  if let Ok(entries) = std::fs::read_dir(path) {
    for entry in entries.flatten() {
      let entry_path = entry.path();
      if entry_path.is_file() {
        size += entry.metadata().map(|m| m.len()).unwrap_or(0);
      } else if entry_path.is_dir() {
        size += dir_size(&entry_path);
      }
    }
  }
  size
}
