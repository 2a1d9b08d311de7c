//! Deferred computation graph scheduler for single-threaded pipelines.
//!
//! This crate lets a compiler front end declare computations ("futures")
//! whose execution must wait for other, possibly still-unknown, computations,
//! and supply externally arriving values ("promises") that complete such
//! dependencies later in the pipeline. It:
//! - Guarantees execution order over an incrementally built, open dependency
//!   graph: a block runs only after every declared dependency completed.
//! - Supports indirection: a block may return another, still-pending future,
//!   whose value is then adopted verbatim once it settles (the Copy state).
//! - Distinguishes true dependency cycles from ordinary blocking on an unset
//!   promise, and diagnoses both with named, attachment-carrying chains.
//! - Allows a controlled, cycle-safe form of out-of-order resolution:
//!   futures marked on-demand can be forced synchronously by reading their
//!   result ahead of the normal execution order.
//!
//! Key modules:
//! - `config`: manager-level settings (`ManagerConfig`).
//! - `future`: the `Future`/`Promise` handle types.
//! - `before`: the `Before` trait describing dependency shapes (one future,
//!   a list, a map, or pairs of descriptors).
//! - `builder`: the fluent `Builder`/`BuilderN` registration API.
//! - `manager`: the `Manager` lifecycle object and the execution engine.
//! - `error`: the `ResolveError` taxonomy and cycle diagnostics.
//!
//! Quick start:
//! 1. Create a `Manager`; create promises via `Manager::promise` and
//!    computables via `Manager::future().after(...).compute(...)` (or
//!    `.delegate(...)` to redirect to another future).
//! 2. Call `Manager::set_result` when a forward-declared value becomes
//!    known, and `Manager::execute` whenever that might unblock work.
//! 3. Call `Manager::finish` exactly once at the end of the pipeline to
//!    assert total completion; read values with `Manager::result`.
//!
//! Everything runs on one cooperative thread: "blocked" just means not yet
//! invoked, a running block always runs to completion, and the only
//! indirection mechanism is the Copy state entered after a block has fully
//! returned. Blocks receive the manager, so the graph may keep growing while
//! it is being resolved.

/// Before-descriptors: composable descriptions of the values that must be
/// ready before a computation may run.
///
/// Exposes the `Before` trait with implementations for one future, a `Vec`
/// of futures, an `IndexMap` of futures, and pairs of descriptors.
pub mod before;
/// The fluent registration API.
///
/// `Builder` accumulates dependencies and settings (name, diagnostic
/// attachment, on-demand flag) before registering a computable via
/// `compute` or `delegate`.
pub mod builder;
/// Manager-level settings.
pub mod config;
/// The `ResolveError` taxonomy and the `CycleNode` diagnostic record.
pub mod error;
/// Future and promise handles.
///
/// `Future<T>` is a copyable typed reference into the manager's arena;
/// `Promise<T>` is the single-assignment producer handle for a future whose
/// value arrives from outside the scheduler.
pub mod future;
/// The manager lifecycle object and the execution engine.
///
/// Contains the node arena, the active/blocked partition of pending
/// computables, the state machine transitions, forced on-demand resolution
/// and the finish-time diagnosis walk.
pub mod manager;
/// Core types used across the crate (identifiers, map aliases).
pub mod types;
