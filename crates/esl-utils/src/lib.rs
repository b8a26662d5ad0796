//! Small, dependency-light building blocks shared by the rest of the
//! workspace: a fixed-capacity array vector/string, ASCII/URL helpers,
//! a bounded-write formatter, and a thread-spawn helper honouring a
//! process-wide stack-size override.

pub mod arrayvec;
pub mod ascii;
pub mod assert;
pub mod fmt;
pub mod thread;
pub mod url;

pub use arrayvec::{ArrayStr, ArrayVec};
