// src/lib.rs

//! mangasync: incremental catalog mirror library

pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
