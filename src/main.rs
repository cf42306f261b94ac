use anyhow::Result;
use clap::Parser;
use resume_upload::cli::{Cli, Command};
use resume_upload::utils::logging;
use resume_upload::{App, Config, ResultOrder};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    match cli.command {
        Command::Submit { paths } => app.run_submit(&paths).await?,
        Command::List { field, direction } => {
            app.list(ResultOrder::new(field, direction)).await;
        }
        Command::Delete { ids } => {
            app.delete(&ids).await;
        }
    }
    app.shutdown().await;

    Ok(())
}
