//! Agent domain: roles, seated agents and the validated roster.

pub mod entities;
