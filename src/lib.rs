pub mod error;
#[path = "bootstrap/app_bootstrap.rs"]
pub mod app_bootstrap;
#[path = "bootstrap/command_registry.rs"]
pub mod command_registry;
#[path = "bootstrap/route_registry.rs"]
pub mod route_registry;
pub mod comm;
pub mod render;
pub mod response;
pub mod state;

// Modules
pub mod modules;

/// 初始化所有模块的命令
pub fn init_commands() {
    modules::register_commands();
}

// Re-export bootstrap modules
pub use app_bootstrap::*;
pub use command_registry::*;
pub use route_registry::*;
