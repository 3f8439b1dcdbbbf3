//! Background loops for continuous processing.

pub mod tick_loop;
pub mod vessel_sync_loop;
