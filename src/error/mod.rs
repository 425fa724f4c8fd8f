mod config;
mod invocation;
mod io;
mod parser;
mod suite;

pub use config::ConfigError;
pub use invocation::InvocationError;
pub use io::IoError;
pub use parser::ParserError;
pub use suite::SuiteError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Suite(#[from] SuiteError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
