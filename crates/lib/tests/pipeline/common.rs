use std::fs;
use std::path::{Path, PathBuf};

use drvpipe_lib::build::Builder;
use drvpipe_lib::pipeline::Pipeline;
use tempfile::TempDir;

/// Compile step: writes `target/release/tool` and a generated manual page.
///
/// The produced executable prints completions for the shell named in
/// `$COMPLETE`, except on platforms listed in `$BROKEN_COMPLETIONS`, where it
/// fails for bash.
pub const BUILD: &str = r##"
mkdir -p target/release/build/tool-4f2a/out/manual/man1
cat > target/release/tool <<SCRIPT
#!/bin/sh
if [ "\$COMPLETE" = bash ] && [ "$DRVPIPE_PLATFORM" = "${BROKEN_COMPLETIONS:-none}" ]; then
  echo "bash completions unavailable" >&2
  exit 2
fi
if [ -n "\$COMPLETE" ]; then
  echo "# \$COMPLETE completions for tool"
  exit 0
fi
echo "tool for $DRVPIPE_PLATFORM"
SCRIPT
chmod +x target/release/tool
echo ".TH TOOL 1" > target/release/build/tool-4f2a/out/manual/man1/tool.1
"##;

pub struct Project {
  pub dir: TempDir,
  pub store: TempDir,
}

impl Project {
  /// A project with `outputs` as the body of the `default` output table.
  pub fn new(platforms: &[&str], default_output: &str) -> Self {
    let dir = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();

    let tags: Vec<String> = platforms.iter().map(|p| format!("{:?}", p)).collect();
    let config = format!(
      r#"
return {{
  platforms = {{ {platforms} }},
  index = {{ path = "packages.json", revision = "r1" }},
  outputs = function(platform, pkgs)
    return {{
      default = {{ {default_output} }},
      dev = {{ tools = {{ "sh", "coreutils" }}, rust_src = {{ package = "coreutils", subpath = "lib/rust" }} }},
    }}
  end,
}}
"#,
      platforms = tags.join(", "),
      default_output = default_output,
    );
    fs::write(dir.path().join("drvpipe.lua"), config).unwrap();

    let packages = r#"{ "sh": { "path": "/" }, "coreutils": { "path": "/usr" } }"#;
    let entries: Vec<String> = platforms.iter().map(|p| format!("{:?}: {}", p, packages)).collect();
    let index = format!(
      r#"{{ "version": 1, "revision": "r1", "platforms": {{ {} }} }}"#,
      entries.join(", ")
    );
    fs::write(dir.path().join("packages.json"), index).unwrap();

    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/Cargo.toml"), "[package]\nname = \"tool\"\n").unwrap();
    fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();

    Self { dir, store }
  }

  pub fn pipeline(&self) -> Pipeline {
    Pipeline::load(&self.dir.path().join("drvpipe.lua"), Builder::new(self.store.path())).unwrap()
  }

  pub fn published(&self) -> Vec<PathBuf> {
    list(&self.store.path().join("build"))
  }

  pub fn sandboxes(&self) -> Vec<PathBuf> {
    list(&self.store.path().join("tmp"))
  }
}

fn list(dir: &Path) -> Vec<PathBuf> {
  match fs::read_dir(dir) {
    Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
    Err(_) => Vec::new(),
  }
}

/// The `default` output used by most tests, with extra Lua fields appended.
pub fn tool_output(extra: &str) -> String {
  format!(
    r#"name = "tool", src = "src", native_build_inputs = {{ pkgs.coreutils, "sh" }},
       env = {{ BROKEN_COMPLETIONS = "aarch64-linux" }},
       build = [[{}]], {}"#,
    BUILD, extra
  )
}

pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
  tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .unwrap()
    .block_on(future)
}
