// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the Courier delivery engines.
//!
//! Implements [`courier_core::Transport`] on top of `reqwest`: JSON `GET` and
//! `POST` with status enforcement, a raw `POST` that hands back status,
//! headers and body untouched, and a streamed byte `PUT` with progress.

pub mod client;

pub use client::HttpTransport;
