//! perftest: device-side UI-automation and performance-measurement core.
//!
//! This crate implements the three tightly-coupled subsystems that make up
//! the engineering core of a UI-automation and perf-test daemon:
//!
//! - a typed front-end [`api`] dispatcher that resolves schema-validated
//!   remote calls to backend handlers and owns the lifetime of opaque
//!   server-side objects,
//! - a bidirectional [`ipc`] transactor layering request/reply semantics,
//!   peer discovery, and death notification on top of a pluggable remote
//!   bus,
//! - a widget-[`select`]ion engine that walks an accessibility tree under
//!   five structural-locator strategies, plus a [`perftest`] orchestrator
//!   that runs iteration loops of (start collectors → client callback →
//!   stop collectors) and aggregates per-metric results.
//!
//! Supporting modules: [`types`] (widgets, rects, windows, matchers, the
//! wire envelope), [`registry`] (the process-wide backend-object table),
//! [`callback`] (the client-side callback bridge), [`error`] (the closed
//! ABI error-code set), and [`observability`] (tracing-subscriber setup).
//!
//! # Module Structure
//!
//! - [`error`]: closed `ErrCode` set and the `ApiCallErr` carrier type
//! - [`types`]: `Widget`, `Rect`, `Window`, matcher and wire types
//! - [`registry`]: backend-object table (store/get/cleanup, owner links)
//! - [`api`]: dispatcher, method signature table, pre-processors
//! - [`select`]: tree iterator contract, visibility refresh, five strategies
//! - [`callback`]: client-side callback bridge (`ThreadLock` pattern)
//! - [`perftest`]: `PerfTestStrategy`, the orchestrator, and `DataCollection`
//! - [`ipc`]: connection state machine, discovery, transact, death recipients
//! - [`observability`]: tracing subscriber initialization for binaries/tests
//! - [`config`]: daemon configuration
//!
//! # API Stability
//!
//! This crate is currently in the 0.x series. Public items should be
//! treated as **unstable** and subject to change; the error-code numbering
//! in [`error::ErrCode`] is the one surface with a stability guarantee,
//! since it is part of the wire ABI.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod api;
pub mod callback;
pub mod config;
pub mod error;
pub mod ipc;
pub mod observability;
pub mod perftest;
pub mod registry;
pub mod select;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{ApiCallErr, ErrCode};
