// Domain layer: plain models and the relay port. No I/O here.

pub mod model;
pub mod ports;
