pub mod batch;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod signal;

pub use detectors::*;
pub use error::*;
pub use metrics::*;
pub use signal::*;
