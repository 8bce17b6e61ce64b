// Domain layer: booking models and the ports the engine depends on.

pub mod model;
pub mod ports;
