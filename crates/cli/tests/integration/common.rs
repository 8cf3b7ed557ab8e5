//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use drvpipe_lib::platform::Platform;
use tempfile::TempDir;

/// Writes `target/release/tool`, a program that prints completions when
/// `$COMPLETE` is set.
pub const BUILD: &str = r##"
mkdir -p target/release
cat > target/release/tool <<'SCRIPT'
#!/bin/sh
if [ -n "$COMPLETE" ]; then
  echo "# $COMPLETE completions for tool"
  exit 0
fi
echo tool
SCRIPT
chmod +x target/release/tool
"##;

/// Isolated project with its own store.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// A project targeting only the host, with `default_output` as the body of
  /// its `default` output table.
  pub fn new(default_output: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let host = host();

    let config = format!(
      r#"
return {{
  platforms = {{ "{host}" }},
  index = {{ path = "packages.json", revision = "r1" }},
  outputs = function(platform, pkgs)
    return {{
      default = {{ {default_output} }},
      dev = {{ tools = {{ "sh", "coreutils" }}, rust_src = {{ package = "coreutils", subpath = "lib/rust" }} }},
    }}
  end,
}}
"#
    );
    let config_path = temp.path().join("drvpipe.lua");
    std::fs::write(&config_path, config).unwrap();

    let index = format!(
      r#"{{ "version": 1, "revision": "r1", "platforms": {{ "{host}": {{ "sh": {{ "path": "/" }}, "coreutils": {{ "path": "/usr" }} }} }} }}"#
    );
    std::fs::write(temp.path().join("packages.json"), index).unwrap();

    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("src/Cargo.toml"), "[package]\nname = \"tool\"\n").unwrap();

    Self { temp, config_path }
  }

  /// Store path (isolated per test).
  pub fn store_path(&self) -> PathBuf {
    let p = self.temp.path().join("store");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn published(&self) -> Vec<PathBuf> {
    match std::fs::read_dir(self.store_path().join("build")) {
      Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
      Err(_) => Vec::new(),
    }
  }

  /// A `drvpipe` command publishing into this project's store.
  pub fn drvpipe_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("drvpipe");
    cmd.env("DRVPIPE_STORE", self.store_path());
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("COMPLETE");
    cmd
  }
}

pub fn host() -> Platform {
  Platform::host().unwrap()
}

/// The `default` output most tests build.
pub fn tool_output(extra: &str) -> String {
  format!(
    r#"name = "tool", src = "src", native_build_inputs = {{ "coreutils", "sh" }}, build = [[{}]], {}"#,
    BUILD, extra
  )
}
