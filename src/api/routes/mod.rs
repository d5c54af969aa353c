//! API route modules.

pub mod accounts;
pub mod clock;
pub mod export;
pub mod records;
pub mod staff;
