//! motion-tweet library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod camera;
pub mod cli;
pub mod config;
pub mod motion;
pub mod motion_loop;
pub mod persist;
pub mod retry;
pub mod shutdown;
pub mod social;
pub mod storage;
