//! CPU raster compositing in premultiplied RGBA8.

pub(crate) mod blend;
pub(crate) mod composite;
pub(crate) mod raster;
