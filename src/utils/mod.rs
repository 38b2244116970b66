//! Small helpers that don't belong to any one component

mod unwrap_or;

pub(crate) use unwrap_or::unwrap_or;
