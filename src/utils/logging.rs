use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化和批处理横幅输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者
///
/// 优先读取 `RUST_LOG`，否则默认 `info`（`verbose` 为真时为 `debug`）。
/// 重复调用不会报错，测试里可以随便调。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件（写入带时间戳的标题）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n答题卡批改日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多线程答题卡批改模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录答题卡加载信息
pub fn log_sheets_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 张待批改的答题卡", total);
    info!("📋 将以每批 {} 张的方式处理", max_concurrent);
    info!("💡 每批完成后再开始下一批\n");
}

pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批答题卡: {}-{} / 共 {} 张", start, end, total);
    info!("{}", "=".repeat(60));
}

pub fn log_batch_complete(batch_num: usize, clean: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 无问题 {}/{}", batch_num, clean, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(
    total: usize,
    clean: usize,
    flagged: usize,
    failed: usize,
    recognition_rate: f64,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部批改完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 无问题: {}/{}", clean, total);
    info!("⚠️ 需复核: {}", flagged);
    info!("❌ 失败: {}", failed);
    info!("🎯 识别率: {:.2}%", recognition_rate);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("Nguyễn Văn An", 6), "Nguyễn...");
        assert_eq!(truncate_text("An", 6), "An");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let path = std::env::temp_dir().join(format!("grader-log-{}.txt", std::process::id()));
        init_log_file(&path.to_string_lossy()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("答题卡批改日志"));
        let _ = std::fs::remove_file(&path);
    }
}
