//! basic_app：School 的增删改查

pub mod cmd;
pub mod forms;
pub mod models;
pub mod routes;
pub mod store;
pub mod views;

pub use cmd::BasicAppCommands;
pub use routes::register_basic_app_routes;
