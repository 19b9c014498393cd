pub mod backend;
pub mod command;
pub mod config;
pub mod database_list;
pub mod file_import;
pub mod panel;
pub mod protocol;
pub mod results_view;
pub mod schema_view;
pub mod session;
