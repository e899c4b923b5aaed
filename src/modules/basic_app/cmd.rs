use super::store::connect_store;
use crate::command_registry::CommandModule;
use crate::comm::EnhancedConfigManager;
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};

/// basic_app 模块的命令处理器
pub struct BasicAppCommands;

#[async_trait]
impl CommandModule for BasicAppCommands {
    fn module_name(&self) -> &'static str {
        super::routes::MODULE
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![
            Command::new("migrate").about("创建 School 表结构（可重复执行）"),
            Command::new("schools")
                .about("列出所有 School")
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("输出格式 (json|text)")
                        .default_value("text"),
                ),
        ]
    }

    async fn handle_command(&self, command_name: &str, matches: &ArgMatches) -> anyhow::Result<()> {
        let config_manager = EnhancedConfigManager::new()?;
        let app_config = config_manager.get_app_config();
        let store = connect_store(&app_config.database_url, app_config.database_max_connections).await?;

        match command_name {
            "migrate" => {
                store.migrate().await?;
                println!("School 表已就绪: {}", app_config.database_url);
            }
            "schools" => {
                store.migrate().await?;
                let schools = store.fetch_all().await?;
                let format = matches
                    .get_one::<String>("format")
                    .map(String::as_str)
                    .unwrap_or("text");
                match format {
                    "json" => println!("{}", serde_json::to_string_pretty(&schools)?),
                    "text" => {
                        for school in &schools {
                            println!(
                                "{}\t{}\t{}\t{}",
                                school.id, school.name, school.principal, school.location
                            );
                        }
                        println!("共 {} 条", schools.len());
                    }
                    other => anyhow::bail!("不支持的输出格式: {}", other),
                }
            }
            other => anyhow::bail!("basic_app 模块不处理命令 '{}'", other),
        }
        Ok(())
    }
}
