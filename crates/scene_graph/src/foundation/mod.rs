//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and TRS composition
//! - Euler angle conversions
//! - Handle-based collections
//! - Logging utilities

pub mod math;
pub mod euler;
pub mod collections;
pub mod logging;
