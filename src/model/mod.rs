//! Stroke records and the effect parameters they carry.

pub(crate) mod params;
pub(crate) mod stroke;
