//! filtergen 交互式命令行
//!
//! 每行输入一个过滤表达式, 默认输出对应的 SQL。
//!
//! ```text
//! :tokens <filter>               显示 token 序列
//! :json <filter>                 显示条件树的 JSON
//! :sql <filter>                  编译为 SQL (默认)
//! :entails <ref> ;; <input>      判断 input 是否满足 ref
//! :quit                          退出
//! ```

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use filtergen::lexer::tokenize;
use filtergen::{entails, generate_condition, QueryConfig, SqlCompiler};

const CONFIG_FILE: &str = "filtergen.json";

/// 加载查询配置，失败时使用默认配置
fn load_config() -> QueryConfig {
    match QueryConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            info!(file = CONFIG_FILE, "loaded query config");
            println!("✅ 成功从JSON配置文件加载查询配置: {}", CONFIG_FILE);
            config
        }
        Err(e) => {
            warn!(error = %e, "falling back to default query config");
            println!("⚠️ 无法加载JSON配置文件 ({}), 使用默认配置", e);
            QueryConfig::default()
        }
    }
}

/// 一行输入对应的命令
enum Command<'a> {
    Tokens(&'a str),
    Json(&'a str),
    Sql(&'a str),
    Entails(&'a str, &'a str),
    Quit,
}

fn parse_command(line: &str) -> Result<Command<'_>> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Sql(line));
    };
    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "tokens" => Ok(Command::Tokens(args)),
        "json" => Ok(Command::Json(args)),
        "sql" => Ok(Command::Sql(args)),
        "entails" => {
            let (reference, input) = args
                .split_once(";;")
                .context("用法: :entails <reference> ;; <input>")?;
            Ok(Command::Entails(reference, input))
        }
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => anyhow::bail!("未知命令: :{other}"),
    }
}

/// 执行一条命令, 返回 false 表示退出
fn run(command: Command<'_>, config: &QueryConfig, compiler: &SqlCompiler) -> Result<bool> {
    match command {
        Command::Tokens(filter) => {
            for token in tokenize(filter) {
                println!("{:>3}..{:<3} {:?}", token.span.start, token.span.end, token.kind);
            }
        }
        Command::Json(filter) => {
            let condition = generate_condition(filter);
            println!("{}", serde_json::to_string_pretty(&condition)?);
        }
        Command::Sql(filter) => {
            let condition = generate_condition(filter);
            let request = config.request(vec![condition]);
            let sql = compiler
                .compile(&config.select, &request)
                .context("SQL 编译失败")?;
            println!("{sql}");
        }
        Command::Entails(reference, input) => {
            let entailed = entails(&generate_condition(reference), &generate_condition(input));
            println!("{entailed}");
        }
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("--- filtergen: 过滤表达式 到 SQL ---");
    let config = load_config();
    let compiler = SqlCompiler::new();

    let mut editor = DefaultEditor::new().context("无法初始化命令行编辑器")?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                let keep_going = parse_command(&line)
                    .and_then(|command| run(command, &config, &compiler))
                    .unwrap_or_else(|e| {
                        println!("✗ {e:#}");
                        true
                    });
                if !keep_going {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("读取输入失败"),
        }
    }
    Ok(())
}
