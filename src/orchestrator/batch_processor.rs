//! 批量答题卡处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一批答题卡的调度和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志标题、加载版式 / 答案表 / 名单（只加载一次，之后只读共享）
//! 2. **批量扫描**：扫描图片目录，按文件名排序
//! 3. **并发控制**：使用 Semaphore 限制同时处理的卡数
//! 4. **分批处理**：一批完成后再开始下一批，结果按输入顺序返回
//! 5. **取消**：取消后不再调度新卡，已开始的卡照常完成，未调度的卡记为未处理
//! 6. **全局统计**：汇总无问题 / 需复核 / 失败数量和识别率

use crate::config::Config;
use crate::infrastructure::Recognizers;
use crate::models::answer_key::AnswerKeyTable;
use crate::models::loaders;
use crate::models::result::{GradingResult, SheetIssue};
use crate::models::roster::Roster;
use crate::orchestrator::sheet_processor;
use crate::services::ReviewWriter;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_sheets_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::{SheetCtx, SheetFlow};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 批处理取消开关，可以跨线程克隆
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 一批的统计
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total: usize,
    /// 没有任何问题
    pub clean: usize,
    /// 有问题但已处理
    pub flagged: usize,
    /// 处理失败或未处理
    pub failed: usize,
    /// 身份完整且得分大于 0
    pub recognized: usize,
}

impl BatchStats {
    fn record(&mut self, result: &GradingResult) {
        self.total += 1;
        if result.is_failed() {
            self.failed += 1;
        } else if result.has_issue {
            self.flagged += 1;
        } else {
            self.clean += 1;
        }
        if result.is_recognized() {
            self.recognized += 1;
        }
    }

    /// 识别率（占已处理卡数的百分比）
    pub fn recognition_rate(&self) -> f64 {
        let processed = self.total - self.failed;
        if processed == 0 {
            return 0.0;
        }
        self.recognized as f64 * 100.0 / processed as f64
    }
}

/// 一批的全部结果（与输入顺序一致）和统计
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<GradingResult>,
    pub stats: BatchStats,
}

impl BatchReport {
    fn from_results(results: Vec<GradingResult>) -> Self {
        let mut stats = BatchStats::default();
        for result in &results {
            stats.record(result);
        }
        Self { results, stats }
    }

    /// 结果写成 JSON 数组
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.results).context("无法序列化批改结果")?;
        std::fs::write(path, json)
            .with_context(|| format!("无法写入结果文件: {}", path.display()))?;
        info!("💾 批改结果已保存至: {}", path.display());
        Ok(())
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<SheetFlow>,
    review: Arc<ReviewWriter>,
    cancel: CancelHandle,
}

impl App {
    /// 初始化应用：加载版式、答案表和名单
    pub async fn initialize(mut config: Config, recognizers: Recognizers) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(config.max_concurrent_sheets);

        if let Some(layout_file) = config.layout_file.clone() {
            config.layout = loaders::load_layout(Path::new(&layout_file)).await?;
            info!("✓ 已加载版式: {}", layout_file);
        }

        let answer_key = loaders::load_answer_key(Path::new(&config.answer_key_file)).await?;
        let mut roster = loaders::load_roster(Path::new(&config.roster_file)).await?;
        if let Some(room) = config.exam_room.as_deref() {
            roster = roster.select_part(room);
            info!("✓ 考场 {}: 名单中 {} 名学生", room, roster.len());
        }

        Ok(Self::from_parts(
            config,
            Arc::new(answer_key),
            Arc::new(roster),
            recognizers,
        ))
    }

    /// 用已加载的数据直接组装
    pub fn from_parts(
        config: Config,
        answer_key: Arc<AnswerKeyTable>,
        roster: Arc<Roster>,
        recognizers: Recognizers,
    ) -> Self {
        let flow = SheetFlow::new(&config, answer_key, roster, recognizers);
        let review = ReviewWriter::with_path(config.review_file.clone());
        Self {
            config,
            flow: Arc::new(flow),
            review: Arc::new(review),
            cancel: CancelHandle::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 取消开关
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// 运行应用主逻辑：扫描图片目录，批改，写结果
    pub async fn run(&self) -> Result<BatchReport> {
        info!("\n📁 正在扫描待批改的答题卡...");
        let sheets = loaders::list_sheet_images(Path::new(&self.config.images_folder)).await?;
        if sheets.is_empty() {
            warn!("⚠️ 没有找到待批改的答题卡，程序结束");
        }

        let report = self.process_sheets(sheets).await;
        report.save_json(Path::new(&self.config.results_file))?;

        print_final_stats(
            report.stats.total,
            report.stats.clean,
            report.stats.flagged,
            report.stats.failed,
            report.stats.recognition_rate(),
            &self.config.output_log_file,
        );
        Ok(report)
    }

    /// 批改给定的答题卡，每张卡都有一条结果
    pub async fn process_sheets(&self, sheets: Vec<PathBuf>) -> BatchReport {
        let total = sheets.len();
        let batch_size = self.config.max_concurrent_sheets.max(1);
        log_sheets_loaded(total, batch_size);

        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total_batches = total.div_ceil(batch_size);
        let mut results = Vec::with_capacity(total);

        for batch_start in (0..total).step_by(batch_size) {
            let batch_end = (batch_start + batch_size).min(total);
            let batch_num = batch_start / batch_size + 1;
            log_batch_start(batch_num, total_batches, batch_start + 1, batch_end, total);

            let batch_results = self
                .process_batch(&sheets[batch_start..batch_end], batch_start, &semaphore)
                .await;

            let clean = batch_results.iter().filter(|r| !r.has_issue).count();
            log_batch_complete(batch_num, clean, batch_results.len());
            results.extend(batch_results);
        }

        BatchReport::from_results(results)
    }

    /// 处理单个批次，结果顺序与输入一致
    async fn process_batch(
        &self,
        batch: &[PathBuf],
        batch_start: usize,
        semaphore: &Arc<Semaphore>,
    ) -> Vec<GradingResult> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, path) in batch.iter().enumerate() {
            let ctx = SheetCtx::new(path.clone(), batch_start + idx + 1);

            if self.cancel.is_cancelled() {
                warn!("{} ⏹️ 批处理已取消，不再调度", ctx);
                handles.push(Scheduled::Skipped(ctx));
                continue;
            }

            let permit = match Arc::clone(semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("{} 无法获取并发许可: {}", ctx, e);
                    handles.push(Scheduled::Skipped(ctx));
                    continue;
                }
            };

            let flow = Arc::clone(&self.flow);
            let review = Arc::clone(&self.review);
            let task_ctx = ctx.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                sheet_processor::process_sheet(&flow, &task_ctx, &review).await
            });
            handles.push(Scheduled::Running(ctx, handle));
        }

        let question_count = self.flow.question_count();
        futures::future::join_all(handles.into_iter().map(|scheduled| async move {
            match scheduled {
                Scheduled::Running(ctx, handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        error!("{} 任务执行失败: {}", ctx, e);
                        sheet_processor::failed_result(&ctx, question_count, e.to_string())
                    }
                },
                Scheduled::Skipped(ctx) => {
                    GradingResult::failed(ctx.file_name(), question_count, SheetIssue::NotProcessed)
                }
            }
        }))
        .await
    }
}

enum Scheduled {
    Running(SheetCtx, tokio::task::JoinHandle<GradingResult>),
    Skipped(SheetCtx),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_cancelled());
        clone.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_stats_classify_results() {
        let mut clean = GradingResult::failed("a.jpg", 2, SheetIssue::MissingVariantCode);
        clean.issues.clear();
        clean.has_issue = false;
        clean.identity.name = "An".into();
        clean.identity.student_id = "1".into();
        clean.identity.sequence_number = "1".into();
        clean.score = 2;

        let flagged = GradingResult::failed("b.jpg", 2, SheetIssue::MissingVariantCode);
        let failed = GradingResult::failed("c.jpg", 2, SheetIssue::NotProcessed);

        let report = BatchReport::from_results(vec![clean, flagged, failed]);
        assert_eq!(
            report.stats,
            BatchStats {
                total: 3,
                clean: 1,
                flagged: 1,
                failed: 1,
                recognized: 1,
            }
        );
        assert_eq!(report.stats.recognition_rate(), 50.0);
        assert_eq!(BatchStats::default().recognition_rate(), 0.0);
    }
}
