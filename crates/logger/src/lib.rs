//! Process-wide tracing setup shared by the urlwatch binaries.

mod tracing;

pub use self::tracing::init as init_tracing;
