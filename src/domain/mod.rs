// Domain layer: records flowing through a matching run and the ports that produce them.

pub mod model;
pub mod ports;
