//! User-interface objects for running simulations
mod simulator;

pub use simulator::{
    infer_weekday, SimulatorBuilder, WeekdayResult, WeekdaySimulator,
};

pub mod error {
    pub use super::simulator::error::*;
}
