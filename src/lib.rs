//! Core library for disco-dive: build a playlist from the discographies of
//! every artist on a seed playlist.
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod token;
pub mod util;
pub mod worker;
