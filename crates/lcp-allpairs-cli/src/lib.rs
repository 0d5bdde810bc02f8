//! All-pairs least-cost path CLI library.
//!
//! This crate provides the output side of the `lcp-allpairs` command: run
//! summaries in text or JSON and GeoJSON export of the delivered network.

pub mod output;
