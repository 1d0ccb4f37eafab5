#![doc = "aip2pdf-core: core logic library for aip2pdf."]

//! Mirrors the AIP publication tree into a local directory tree and assembles the
//! extracted page images of every directory into a printable PDF.
//!
//! # Usage
//! Build an [`fetch::HttpFetcher`] (or any [`contract::Fetcher`]), a
//! [`config::MirrorConfig`] and an [`config::AssembleConfig`], then call
//! [`synchronise::synchronise`]. [`assemble::assemble`] can also be run on its own
//! against an existing local directory.

pub mod assemble;
pub mod config;
pub mod contract;
pub mod decode;
pub mod document;
pub mod error;
pub mod fetch;
pub mod sanitize;
pub mod synchronise;
