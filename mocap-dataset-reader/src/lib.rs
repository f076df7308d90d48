pub mod atomic_write;
pub mod motive_reader;
pub mod param_file;
pub mod trajectory_file;
