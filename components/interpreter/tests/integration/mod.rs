//! Integration tests for the interpreter running whole programs

mod test_builtins;
mod test_save;
mod test_state;
