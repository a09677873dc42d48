//! # Java Syntax
//!
//! A small, lossless view of Java source files used by layout detection and
//! the migration rewrites.
//!
//! [`tokenize`] splits a file into tokens that concatenate back to the input;
//! [`CompilationUnit::parse`] groups them into a tree of packages, imports,
//! annotations, type declarations, routines and calls, with everything else
//! kept as text. Rewrites go through [`VisitMut`] and only the nodes they touch
//! print differently.

mod lexer;
mod tree;

pub use lexer::*;
pub use tree::*;

#[cfg(test)]
mod tests;
