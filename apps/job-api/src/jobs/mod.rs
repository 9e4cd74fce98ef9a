//! Job bookkeeping: the shared completion registry and the backend that
//! eventually completes each job.

pub mod backend;
pub mod registry;
