pub mod controller;
pub mod loop_control;
pub mod run_log;
pub mod state;

#[cfg(test)]
pub(crate) mod fakes;
