mod formatter;

pub use formatter::{CensusOutput, OutputFormatter, RunOutput};
