pub mod calibration;
pub mod consent;
pub mod history;
pub mod quality;
pub mod reference;
pub mod session;
pub mod telemetry;
