pub mod alerts;
pub mod fixes;
pub mod rules;
