#![cfg(unix)]

mod build_tests;
mod common;
mod develop_tests;
