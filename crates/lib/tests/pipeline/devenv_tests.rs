use drvpipe_lib::shell::Shell;

use super::common::{Project, tool_output};

#[test]
fn develop_assembles_from_the_index_without_touching_the_store() {
  let project = Project::new(&["x86_64-linux"], &tool_output(""));

  let dev = project.pipeline().develop(&"x86_64-linux".parse().unwrap()).unwrap();

  assert_eq!(dev.tools.len(), 2);
  assert_eq!(dev.path(), "/bin:/usr/bin");
  assert_eq!(dev.env["RUST_SRC_PATH"], "/usr/lib/rust");
  assert!(
    dev
      .activation_script(Shell::Zsh)
      .contains("export RUST_SRC_PATH='/usr/lib/rust'")
  );
  assert!(project.published().is_empty());
  assert!(project.sandboxes().is_empty());
  assert_eq!(std::fs::read_dir(project.store.path()).unwrap().count(), 0);
}
