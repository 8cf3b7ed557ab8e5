//! End-to-end pipeline tests: configuration, index, build, augment, publish.
//!
//! Builds here run real `/bin/sh` stages; the "compiler" is a shell script
//! that writes a self-describing executable and generated manual pages.

#![cfg(unix)]

mod augment_tests;
mod build_tests;
mod common;
mod devenv_tests;
