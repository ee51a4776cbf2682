pub mod adjust;
pub mod bands;
pub mod buffer;
