//! ish: a small Unix shell built around a process-pipeline engine.
//!
//! A line is tokenized ([`lexer`]), split at `;` into lists and at `&&`/`||`
//! into segments ([`parser`]), and each segment's pipeline is run by the
//! [`eval::Executor`]: N stages, N-1 pipes ([`pipes`]), one fork per stage
//! ([`launcher`]) with file redirections applied in the child ([`redirect`]).
//! Foreground pipelines are waited on and report their last stage's status;
//! background ones are tracked in a [`job::JobTable`] and reaped later.

pub mod builtin;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod history;
pub mod job;
pub mod launcher;
pub mod lexer;
pub mod parser;
pub mod pipes;
pub mod redirect;
pub mod types;

pub use error::{ShellError, ShellResult};
pub use eval::Executor;
pub use types::{CommandStage, Connective, ExitStatus, OutputFile, OutputMode, Pipeline, Segment};
