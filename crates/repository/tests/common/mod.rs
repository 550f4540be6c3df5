//! Common test utilities for endpoint testing.
//!
//! - [`fixtures`] - Test records, schemas and a wired endpoint
//! - [`assertions`] - Response assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
