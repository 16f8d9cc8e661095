//! Shared test code.
#![allow(dead_code)]

include!("../tests/common.rs");
