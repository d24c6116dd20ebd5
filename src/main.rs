use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

use sixbit_hide::{
    cli::{Cli, Commands},
    handler::{handle_capacity, handle_hide, handle_recover, handle_verify},
};

/// 按 `-v` 次数初始化日志，`RUST_LOG` 优先。
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
        Commands::Capacity(args) => handle_capacity(args).map(|_| ()),
        Commands::Verify(args) => handle_verify(args).map(|_| ()),
    }
}
