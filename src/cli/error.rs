use miette::Diagnostic;
use thiserror::Error;

use crate::db::DbError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("Could not read document file '{path}'")]
    #[diagnostic(
        code(apd::cli::read_file),
        help("Check that the path exists and is readable.")
    )]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Document file is not valid JSON: {0}")]
    #[diagnostic(code(apd::cli::parse))]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),
}

pub type CliResult<T> = Result<T, CliError>;
