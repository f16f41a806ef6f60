#![doc = "depotfetch-core: source resolution and manifest decoding pipeline for depotfetch."]

//! This crate contains the whole fetch pipeline: the retrying transport, the
//! format decoders, the per-source adapters, the resolver that walks the ordered
//! source list, and the artifact store that writes manifests, the key file and
//! the DepotDownloaderMod invocation script.
//!
//! CLI parsing, YAML config loading and credential provisioning live in the
//! `depotfetch` crate.
//!
//! # Usage
//! Build a [`session::Session`] around a [`contract::Transport`] and an
//! [`store::ArtifactStore`], hand it to a [`resolve::Resolver`] together with the
//! ordered source list, and call [`resolve::Resolver::resolve`].

pub mod config;
pub mod contract;
pub mod decode;
pub mod error;
pub mod resolve;
pub mod script;
pub mod session;
pub mod source;
pub mod store;
pub mod transport;
