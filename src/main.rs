use advcbv::comm::tracing::init_tracing;
use advcbv::comm::EnhancedConfigManager;
use advcbv::{build_app, handle_command, init_commands, AppBootstrap, AppConfig};
use clap::ArgMatches;
use std::error::Error;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 初始化所有模块的命令
    init_commands();

    // 构建命令行应用
    let matches: ArgMatches = build_app().get_matches();

    match matches.subcommand() {
        Some(("server", sub_matches)) => {
            handle_server_command(sub_matches).await?;
        }
        Some(("version", _)) => {
            handle_version_command();
        }
        Some((command_name, sub_matches)) => {
            // 尝试使用模块处理命令
            if let Err(e) = handle_command(command_name, sub_matches).await {
                eprintln!("处理命令 '{}' 时出错: {:#}", command_name, e);
                std::process::exit(1);
            }
        }
        _ => {
            // subcommand_required(true) 保证不会走到这里
            eprintln!("未知命令，请使用 --help 查看可用命令");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn handle_version_command() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

async fn handle_server_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    // 创建并初始化增强的配置管理器
    let mut config_manager = EnhancedConfigManager::new()?;

    // 命令行参数覆盖配置文件
    {
        let app_config = config_manager.get_app_config_mut();
        if let Some(host) = matches.get_one::<String>("host") {
            app_config.server_host = host.clone();
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            app_config.server_port = *port;
        }
        if let Some(workers) = matches.get_one::<usize>("workers") {
            app_config.server_workers = Some(*workers);
        }
        if matches.get_flag("debug") {
            app_config.server_debug = true;
        }
    }
    config_manager.revalidate()?;

    let app_config = config_manager.get_app_config().clone();
    init_tracing(&app_config.logging_level, app_config.logging_json_format)?;

    // 验证必需的配置
    config_manager.validate_required_config()?;

    // 打印配置摘要
    config_manager.print_config_summary();

    let config = AppConfig::from(&app_config);
    AppBootstrap::new(app_config).with_config(config).run().await?;

    Ok(())
}
