//! MemBase: an in-memory, file-persisted wide-column store in the HBase
//! mold, driven by a textual command shell.
//!
//! The pieces line up with the data flow: a command line goes through
//! [`command`] into the [`dispatch`] layer, which calls the [`catalog`];
//! the catalog owns the [`api`] table engine and persists whole-table
//! snapshots through [`storage`]. Replies come back as [`result`] values
//! for whatever renderer sits on top (the bundled binary is a plain stdin
//! shell).

pub mod api;
pub mod catalog;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod result;
pub mod storage;
