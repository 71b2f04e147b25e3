//! The stroke session: lifecycle, notifications and export naming.

pub(crate) mod clock;
pub(crate) mod export;
pub(crate) mod manager;
pub(crate) mod notify;
