//! Keep markdown documentation in sync with code.
//!
//! Documentation sections are fenced by `docsync:start` / `docsync:end`
//! comments that name the code symbol they describe. An anchor map records
//! the signature hash each section was written against; when the code's
//! signature hash changes the section has drifted, and the fix pipeline
//! regenerates it in place.

pub mod analyzer;
pub mod anchor;
pub mod atomic;
pub mod commands;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod drift;
pub mod error;
pub mod generator;
pub mod grammar;
pub mod injector;
pub mod locks;
pub mod map_store;
pub mod orchestrator;
pub mod retry;
pub mod scanner;
pub mod types;
pub mod vcs;
pub mod watch;
