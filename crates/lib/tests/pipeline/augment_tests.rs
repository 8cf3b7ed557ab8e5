use drvpipe_lib::augment::AugmentError;
use drvpipe_lib::build::{BuildError, BuildStage};
use drvpipe_lib::pipeline::PipelineError;
use drvpipe_lib::platform::Platform;
use drvpipe_lib::shell::Shell;

use super::common::{BUILD, Project, block_on, tool_output};

#[test]
fn missing_manual_pages_publish_nothing() {
  let project = Project::new(
    &["x86_64-linux"],
    &tool_output(r#"completions = true, man_pages = "build/other-*/out/manual/man1/*""#),
  );

  let err = block_on(project.pipeline().realize(&"x86_64-linux".parse().unwrap())).unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Build(BuildError::Augment(AugmentError::ManualPageNotFound { ref pattern }))
      if pattern == "build/other-*/out/manual/man1/*"
  ));
  assert!(project.published().is_empty());
  assert!(project.sandboxes().is_empty());
}

#[test]
fn completion_failure_is_isolated_to_its_platform() {
  let project = Project::new(
    &["x86_64-linux", "aarch64-linux"],
    &tool_output(r#"completions = { shells = { "bash", "zsh" } }"#),
  );
  let linux: Platform = "x86_64-linux".parse().unwrap();
  let arm: Platform = "aarch64-linux".parse().unwrap();

  let results = block_on(project.pipeline().realize_all(&[linux, arm]));

  match &results[&arm] {
    Err(PipelineError::Build(BuildError::Augment(AugmentError::CompletionGeneration {
      shell,
      exit_code,
      stderr,
    }))) => {
      assert_eq!(*shell, Shell::Bash);
      assert_eq!(*exit_code, Some(2));
      assert_eq!(stderr, "bash completions unavailable");
    }
    other => panic!("unexpected result for {arm}: {other:?}"),
  }

  let tree = results[&linux].as_ref().unwrap();
  assert_eq!(tree.shell_completions.len(), 2);
  assert_eq!(project.published(), vec![tree.root.clone()]);
}

#[test]
fn completions_require_an_executable() {
  // The compile stage succeeds but leaves the binary under another name, so
  // no completion subprocess may ever run.
  let project = Project::new(
    &["x86_64-linux"],
    r#"name = "tool", src = "src", native_build_inputs = { "coreutils", "sh" },
       build = "mkdir -p target/release && touch target/release/tool-renamed",
       completions = true"#,
  );

  let err = block_on(project.pipeline().realize(&"x86_64-linux".parse().unwrap())).unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Build(BuildError::Failed {
      stage: BuildStage::Compile,
      exit_code: None,
      ..
    })
  ));
  assert!(project.published().is_empty());
}

#[test]
#[tracing_test::traced_test]
fn manual_pages_from_every_matching_directory_are_installed() {
  let build = format!(
    "{}\nmkdir -p target/release/build/tool-9c1d/out/manual/man1\n\
     echo '.TH TOOL-OPEN 1' > target/release/build/tool-9c1d/out/manual/man1/tool-open.1\n",
    BUILD
  );
  let project = Project::new(
    &["x86_64-linux"],
    &format!(
      r#"name = "tool", src = "src", native_build_inputs = {{ "coreutils", "sh" }},
         build = [[{}]], man_pages = "build/tool-*/out/manual/man1/*""#,
      build
    ),
  );

  let tree = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .unwrap()
    .block_on(project.pipeline().realize(&"x86_64-linux".parse().unwrap()))
    .unwrap();

  assert_eq!(
    tree.manual_pages,
    vec![
      tree.root.join("share/man/man1/tool-open.1"),
      tree.root.join("share/man/man1/tool.1"),
    ]
  );
  assert!(tree.manual_pages.iter().all(|page| page.is_file()));
  assert!(logs_contain("manual pages matched in more than one directory"));
}

#[test]
fn completions_run_in_the_pre_build_session() {
  // The built executable refuses to run without a writable home, as tools
  // that load a config file at startup do.
  let project = Project::new(
    &["x86_64-linux"],
    r##"name = "tool", src = "src", native_build_inputs = { "coreutils", "sh" },
       pre_build = 'export HOME="$(mktemp -d)"',
       build = [[
mkdir -p target/release
printf '#!/bin/sh\ntouch "$HOME/.toolrc" || exit 1\necho "# $COMPLETE completions"\n' > target/release/tool
chmod +x target/release/tool
]],
       completions = { shells = { "bash", "fish" } }"##,
  );

  let tree = block_on(project.pipeline().realize(&"x86_64-linux".parse().unwrap())).unwrap();

  assert_eq!(tree.shell_completions.len(), 2);
  assert_eq!(
    std::fs::read_to_string(&tree.shell_completions[&Shell::Fish]).unwrap(),
    "# fish completions\n"
  );
}
