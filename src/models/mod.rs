// Recorder Settings Models
// Data structures for the preference record

mod preferences;

pub use preferences::*;
