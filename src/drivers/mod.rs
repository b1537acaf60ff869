//! Hardware initialisation and the wake timer.

pub mod hw_init;
pub mod hw_timer;
