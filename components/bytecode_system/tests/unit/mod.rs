//! Unit tests for the program model

mod test_program;
mod test_unit;
