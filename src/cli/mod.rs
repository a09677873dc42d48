//! # CLI Module
//!
//! Command-line front end of the `specforge-gen` binary.
//!
//! ## Commands
//!
//! ### `run`
//!
//! Generate code for a project, and in migrate mode rewrite its legacy
//! integration:
//!
//! ```bash
//! specforge-gen run --mode migrate \
//!     --legacy-spec bundled:legacy-gateway.yaml \
//!     --target-spec bundled:target-gateway.yaml \
//!     --scope tags --tags Transactions \
//!     --project-root ../payments-service
//! ```
//!
//! Options:
//! - `--mode <MODE>` - `migrate` (alias `upgrade`) or `scaffold` (alias `create`)
//! - `--scope <SCOPE>` - `all` (default), `tags` or `operations`
//! - `--tags` / `--operations` - selectors for the scope, comma-separated
//! - `--dry-run` - compute every change without writing
//! - `--json` - print the run response as JSON
//!
//! Exit codes: `0` success, `2` partial success, `1` failure.
//!
//! ### `detect`
//!
//! Print the package layout detected in a project:
//!
//! ```bash
//! specforge-gen detect --project-root ../payments-service
//! ```
//!
//! ### `inspect`
//!
//! List the operations of a specification, optionally for one tag:
//!
//! ```bash
//! specforge-gen inspect --spec bundled:target-gateway.yaml --tag Transactions
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use specforge::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let code = run_cli(Cli::parse())?;
//! std::process::exit(code);
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{describe_response, inspect_lines, run_cli, Cli, Commands, RunArgs};
