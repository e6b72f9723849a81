//! 单张答题卡处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **流程调度**：委托 `SheetFlow` 跑完四段流程
//! 2. **失败隔离**：流程出错时生成一条带问题的占位结果，绝不向上抛
//! 3. **复核登记**：有问题的卡追加到复核清单
//! 4. **统计输出**：记录单张卡的处理结果

use crate::models::result::{GradingResult, SheetIssue};
use crate::services::ReviewWriter;
use crate::workflow::{SheetCtx, SheetFlow};
use tracing::{error, info, warn};

/// 处理单张答题卡，永远返回一条结果
pub async fn process_sheet(flow: &SheetFlow, ctx: &SheetCtx, review: &ReviewWriter) -> GradingResult {
    info!("{} 开始处理: {}", ctx, ctx.path.display());

    let result = match flow.run(ctx).await {
        Ok(result) => result,
        Err(e) => {
            error!("{} ❌ 处理过程中发生错误: {:#}", ctx, e);
            failed_result(ctx, flow.question_count(), format!("{:#}", e))
        }
    };

    if let Err(e) = review.write(&result) {
        warn!("{} ⚠️ 写入复核清单失败: {:#}", ctx, e);
    }

    log_sheet_complete(ctx, &result);
    result
}

/// 失败占位结果
pub fn failed_result(ctx: &SheetCtx, question_count: usize, message: String) -> GradingResult {
    GradingResult::failed(
        ctx.file_name(),
        question_count,
        SheetIssue::ProcessingFailed { message },
    )
}

// ========== 日志辅助函数 ==========

fn log_sheet_complete(ctx: &SheetCtx, result: &GradingResult) {
    if result.has_issue {
        info!(
            "{} ⚠️ 处理完成，需复核: {}",
            ctx,
            crate::utils::logging::truncate_text(&result.issue_summary(), 120)
        );
    } else {
        info!("{} ✅ 处理完成，得分 {}", ctx, result.score);
    }
}
