//! Core library components.
//!
//! This module contains the document model, entity mapping metadata, the
//! converter between the two, and the key-value adapter built on a backend.

pub mod adapter;
pub mod config;
pub mod constants;
pub mod convert;
pub mod document;
pub mod mapping;
pub mod repository;
pub mod store;
pub mod types;
pub mod validation;
