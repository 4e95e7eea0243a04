pub mod jmx;
pub mod sensitivity;
pub mod stats;
