//! Core crate of mathprog, a library for building and solving small
//! mathematical programs (LP, IP, NLP, MILP, MINLP) from user-entered
//! identifiers, parameter tables and arithmetic expressions.

pub mod configuration;
pub mod io;
pub mod optimize;
pub mod program;
