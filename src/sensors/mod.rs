//! Sensor module - flight, power and emergency-stop collaborators

mod emergency;
mod manager;
mod power;
mod simulator;
mod traits;

pub use emergency::{EmergencyStop, FixedLevel, SysfsLevelInput};
pub use manager::{SensorHub, SensorStats};
pub use power::BatteryModel;
pub use simulator::{SimulatedDetections, SimulatedFlight, SimulatedPower};
pub use traits::{
    FlightSensors, GpsFix, LevelInput, PowerMonitor, PowerStatus, RailReading, SensorSnapshot,
};
