pub mod app;
pub mod cli;
pub mod csv_io;
pub mod form;
pub mod logging;
pub mod report;
pub mod utils;
