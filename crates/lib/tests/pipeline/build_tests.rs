use std::fs;

use drvpipe_lib::build::{BuildError, BuildStage, Verification, verify_output};
use drvpipe_lib::index::IndexError;
use drvpipe_lib::pipeline::PipelineError;
use drvpipe_lib::platform::Platform;
use drvpipe_lib::shell::Shell;

use super::common::{Project, block_on, tool_output};

fn linux() -> Platform {
  "x86_64-linux".parse().unwrap()
}

#[test]
fn publishes_complete_output_tree() {
  let project = Project::new(
    &["x86_64-linux"],
    &tool_output(r#"completions = true, man_pages = "build/tool-*/out/manual/man1/*""#),
  );

  let tree = block_on(project.pipeline().realize(&linux())).unwrap();

  assert_eq!(tree.root, project.store.path().join("build").join(&tree.hash.0));
  assert_eq!(tree.executable, tree.root.join("bin/tool"));
  assert_eq!(
    tree.shell_completions.keys().copied().collect::<Vec<_>>(),
    [Shell::Bash, Shell::Fish, Shell::Zsh]
  );
  assert_eq!(
    fs::read_to_string(tree.root.join("share/bash-completion/completions/tool.bash")).unwrap(),
    "# bash completions for tool\n"
  );
  assert!(tree.root.join("share/zsh/site-functions/_tool").is_file());
  assert_eq!(tree.manual_pages, vec![tree.root.join("share/man/man1/tool.1")]);
  assert!(matches!(verify_output(&tree.root).unwrap(), Verification::Intact(_)));
  assert!(project.sandboxes().is_empty());
}

#[test]
fn rebuilding_is_deterministic() {
  let output = tool_output(r#"completions = true, man_pages = "build/tool-*/out/manual/man1/*""#);
  let first = Project::new(&["x86_64-linux"], &output);
  let second = Project::new(&["x86_64-linux"], &output);

  let a = block_on(first.pipeline().realize(&linux())).unwrap();
  let b = block_on(second.pipeline().realize(&linux())).unwrap();

  assert_eq!(a.hash, b.hash);
  assert_eq!(a.output_hash, b.output_hash);
  assert_eq!(fs::read(&a.executable).unwrap(), fs::read(&b.executable).unwrap());
}

#[test]
fn unknown_input_fails_before_compiling() {
  let project = Project::new(
    &["x86_64-linux"],
    r#"name = "tool", src = "src", native_build_inputs = { "cargo" }, build = "touch compiled""#,
  );

  let err = block_on(project.pipeline().realize(&linux())).unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Build(BuildError::Index(IndexError::UnknownPackage { ref name, .. })) if name == "cargo"
  ));
  assert!(project.sandboxes().is_empty());
  assert!(project.published().is_empty());
  assert!(!project.dir.path().join("src/compiled").exists());
}

#[test]
fn compile_failure_carries_stage_log() {
  let project = Project::new(
    &["x86_64-linux"],
    r#"name = "tool", src = "src", native_build_inputs = { "sh" },
       build = "echo 'error[E0425]: cannot find value' >&2; exit 101""#,
  );

  let err = block_on(project.pipeline().realize(&linux())).unwrap_err();

  let PipelineError::Build(err) = err else {
    panic!("expected a build error, got {err}");
  };
  assert!(matches!(
    err,
    BuildError::Failed {
      stage: BuildStage::Compile,
      exit_code: Some(101),
      ..
    }
  ));
  assert_eq!(err.log(), Some("error[E0425]: cannot find value"));
  assert!(project.published().is_empty());
}

#[test]
fn pre_build_home_is_visible_to_compile() {
  let project = Project::new(
    &["x86_64-linux"],
    &tool_output(
      r#"pre_build = 'export HOME="$(mktemp -d)"',
         post_build = 'test -d "$HOME" && test "$HOME" != /homeless-shelter'"#,
    ),
  );

  block_on(project.pipeline().realize(&linux())).unwrap();
}

#[test]
fn source_tree_is_never_modified() {
  let project = Project::new(&["x86_64-linux"], &tool_output(""));
  let before = drvpipe_lib::util::hash::hash_directory(&project.dir.path().join("src"), &[]).unwrap();

  block_on(project.pipeline().realize(&linux())).unwrap();

  let after = drvpipe_lib::util::hash::hash_directory(&project.dir.path().join("src"), &[]).unwrap();
  assert_eq!(before, after);
  assert!(!project.dir.path().join("src/target").exists());
}
