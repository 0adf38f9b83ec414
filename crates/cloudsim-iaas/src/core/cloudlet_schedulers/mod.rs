//! Cloudlet scheduling policies.

pub mod space_shared;
pub mod time_shared;
