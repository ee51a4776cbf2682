pub mod forecast;
pub mod risk;
pub mod rule;
pub mod scenario;
