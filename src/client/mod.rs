//! Remote effect service access.
//!
//! Routes: `GET /effects`, `POST /render/{effect}` (multipart image) and
//! `POST /render/{effect}/stroke` (JSON stroke payload).

pub(crate) mod config;
pub(crate) mod effects;
