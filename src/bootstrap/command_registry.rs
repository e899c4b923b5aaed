use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// 命令注册器 trait，各模块实现此 trait 来注册命令
#[async_trait]
pub trait CommandModule: Send + Sync {
    /// 获取模块名称
    fn module_name(&self) -> &'static str;

    /// 注册模块的子命令
    fn register_commands(&self) -> Vec<Command>;

    /// 处理模块命令
    async fn handle_command(&self, command_name: &str, matches: &ArgMatches) -> anyhow::Result<()>;
}

/// 命令注册器，使用单例模式
#[derive(Default)]
pub struct CommandRegistry {
    modules: BTreeMap<String, Arc<dyn CommandModule>>,
}

impl CommandRegistry {
    /// 创建新的命令注册器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取全局单例实例
    pub fn instance() -> &'static Mutex<CommandRegistry> {
        static INSTANCE: OnceLock<Mutex<CommandRegistry>> = OnceLock::new();
        INSTANCE.get_or_init(|| Mutex::new(CommandRegistry::new()))
    }

    /// 注册模块
    pub fn register_module(&mut self, module: Box<dyn CommandModule>) {
        let module_name = module.module_name().to_string();
        self.modules.insert(module_name, Arc::from(module));
    }

    /// 构建完整的命令行应用
    pub fn build_app(&self) -> Command {
        let mut app = Command::new("advcbv")
            .version(env!("CARGO_PKG_VERSION"))
            .about("School 管理站点")
            .subcommand_required(true)
            .arg_required_else_help(true);

        // 内置的 server 命令，参数未给出时使用配置文件中的值
        app = app.subcommand(
            Command::new("server")
                .about("启动 Web 服务器")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("设置服务器主机地址"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("设置服务器端口")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_name("WORKERS")
                        .help("设置工作线程数")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("debug")
                        .short('d')
                        .long("debug")
                        .help("启用调试模式")
                        .action(clap::ArgAction::SetTrue),
                ),
        );

        app = app.subcommand(Command::new("version").about("显示版本信息"));

        for module in self.modules.values() {
            for command in module.register_commands() {
                app = app.subcommand(command);
            }
        }

        app
    }

    /// 查找处理某个命令的模块
    pub fn find_module(&self, command_name: &str) -> Option<Arc<dyn CommandModule>> {
        self.modules
            .values()
            .find(|module| {
                module
                    .register_commands()
                    .iter()
                    .any(|command| command.get_name() == command_name)
            })
            .cloned()
    }

    /// 获取所有注册的模块名称
    pub fn get_registered_modules(&self) -> Vec<&str> {
        self.modules.keys().map(|s| s.as_str()).collect()
    }
}

fn registry() -> MutexGuard<'static, CommandRegistry> {
    // 注册表只在启动阶段写入，锁中毒时内容依然可用
    CommandRegistry::instance()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 便捷函数：注册模块
pub fn register_module(module: Box<dyn CommandModule>) {
    registry().register_module(module);
}

/// 便捷函数：按当前注册的模块构建命令行
pub fn build_app() -> Command {
    registry().build_app()
}

/// 便捷函数：把命令交给对应模块处理
pub async fn handle_command(command_name: &str, matches: &ArgMatches) -> anyhow::Result<()> {
    // 先取出模块再释放锁，避免跨 await 持锁
    let module = registry().find_module(command_name);
    match module {
        Some(module) => module.handle_command(command_name, matches).await,
        None => anyhow::bail!("未找到处理命令 '{}' 的模块", command_name),
    }
}
