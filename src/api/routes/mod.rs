//! API Routes
//!
//! Route handlers organized by functionality.

pub mod health;
pub mod keep;
pub mod segments;
pub mod status;
