pub mod process_runner;
