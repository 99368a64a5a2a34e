//! Endpoints behind the JWT middleware. Every handler receives the resolved
//! `Identity` as a request extension and passes it into the services, which
//! enforce role and institution-scope rules.

pub mod institution;
pub mod letter;
pub mod person;
pub mod submission;
