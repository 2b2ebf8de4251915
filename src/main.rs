use anyhow::Context;
use filter_dispatcher::config::CatalogConfig;
use filter_dispatcher::sql_compiler::SqlCompiler;
use filter_dispatcher::{CustomQueryRequest, ModelCatalog, QueryCompiler, QueryStructure};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 没有指定模型时使用的表名
const DEFAULT_TABLE: &str = "records";

/// 加载模型目录，失败时使用内置目录
fn load_catalog() -> CatalogConfig {
    match CatalogConfig::from_env() {
        Ok(config) => {
            info!(models = config.catalog().len(), "loaded model catalog");
            config
        }
        Err(e) => {
            warn!(error = %e, "using builtin model catalog");
            CatalogConfig::builtin()
        }
    }
}

/// 编译一条 JSON 请求, 返回编译结果与生成的 SQL
fn run_request(catalog: &dyn ModelCatalog, line: &str) -> anyhow::Result<(QueryStructure, String)> {
    let request: CustomQueryRequest =
        serde_json::from_str(line).context("请求不是合法的 JSON")?;

    let (compiler, sql_compiler) = match request.model.as_deref() {
        Some(model) => (
            QueryCompiler::with_catalog(catalog, model),
            SqlCompiler::for_model(catalog, model),
        ),
        None => (QueryCompiler::new(), SqlCompiler::new(DEFAULT_TABLE)),
    };

    let structure = compiler.compile(&request.filters, &request.connectives)?;
    let sql = sql_compiler.compile(&structure).sql;
    Ok((structure, sql))
}

fn print_result(catalog: &dyn ModelCatalog, line: &str) {
    match run_request(catalog, line) {
        Ok((structure, sql)) => {
            match serde_json::to_string_pretty(&structure) {
                Ok(json) => println!("[查询结构]:\n{}", json),
                Err(e) => println!("✗ 无法序列化查询结构: {}", e),
            }
            println!("[生成的 SQL]:\n{}", sql);
        }
        Err(e) => println!("✗ 编译失败: {:#}", e),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("--- Filter Dispatcher: 过滤条件到查询编译器 ---");
    let config = load_catalog();
    let catalog = config.catalog();

    // 示例请求
    let example = r#"{"filters":[{"filter":{"operator":"contains","value":"ana"},"field":{"fieldName":"name","fieldType":"string"}},{"filter":{"operator":"in","value":[1,2]},"field":{"fieldName":"roles","fieldType":"entity"}},{"filter":{"operator":"biggerThan","value":"7"},"field":{"fieldName":"score","fieldType":"number"}}],"connectives":["and","or"],"model":"patient"}"#;
    println!("\n[示例请求]:\n{}\n", example);
    print_result(catalog, example);

    println!("\n每行输入一个 JSON 请求, 输入 exit 退出");
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                editor.add_history_entry(line)?;
                print_result(catalog, line);
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
