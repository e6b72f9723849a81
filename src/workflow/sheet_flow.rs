//! 答题卡处理流程 - 流程层
//!
//! 核心职责：定义"一张卡"的完整处理流程
//!
//! 流程顺序（严格的四段依赖）：
//! 1. 切图（转正 → 二值化 → 轮廓 → 区域）
//! 2. 外部识别（涂卡检测 + 代码/姓名/学号/序号文字识别，互不依赖，并发）
//! 3. 组卷 + 身份校正（互不依赖，并发）
//! 4. 评分 → 生成结果

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::{RecognitionOutcome, RecognitionRequest, Recognizers};
use crate::models::answer_key::AnswerKeyTable;
use crate::models::detection::Detection;
use crate::models::identity::{IdentitySignal, MatchStatus};
use crate::models::result::{GradingResult, SheetIssue};
use crate::models::roster::Roster;
use crate::models::sheet::{RegionName, RegionSet};
use crate::services::text_cleanup::{
    clean_name, clean_sequence_number, clean_student_id, clean_variant_code,
};
use crate::services::{
    scale_score, AnswerAssembler, AssemblyStatus, IdentityReconciler, RegionSegmenter, ScoreStatus,
    ScoringEngine,
};
use crate::workflow::sheet_ctx::SheetCtx;

/// 答题卡处理流程
///
/// - 编排一张卡的四段流程
/// - 不持有任何可变状态，多张卡可以共享同一个实例并发运行
/// - 只依赖业务能力（services）和注入的识别能力（infrastructure）
pub struct SheetFlow {
    segmenter: Arc<RegionSegmenter>,
    assembler: AnswerAssembler,
    reconciler: Arc<IdentityReconciler>,
    scoring: ScoringEngine,
    recognizers: Recognizers,
    question_count: usize,
    max_points: f64,
    regions_folder: Option<PathBuf>,
}

impl SheetFlow {
    pub fn new(
        config: &Config,
        answer_key: Arc<AnswerKeyTable>,
        roster: Arc<Roster>,
        recognizers: Recognizers,
    ) -> Self {
        Self {
            segmenter: Arc::new(RegionSegmenter::new(config.layout.clone())),
            assembler: AnswerAssembler::new(config.cluster_radius_px, config.layout.column_count),
            reconciler: Arc::new(IdentityReconciler::new(
                roster,
                config.name_match_threshold,
                config.id_match_threshold,
            )),
            question_count: answer_key.question_count(),
            scoring: ScoringEngine::new(answer_key),
            recognizers,
            max_points: config.max_points,
            regions_folder: config.regions_folder.as_ref().map(PathBuf::from),
        }
    }

    /// 题目数量（每张卡的答案序列长度）
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub async fn run(&self, ctx: &SheetCtx) -> Result<GradingResult> {
        let mut issues = Vec::new();

        // ========== 阶段 1: 切图 ==========
        info!("{} ✂️ 正在切图: {}", ctx, ctx.file_name());
        let regions = self.segment(ctx).await?;
        for region in regions.missing() {
            warn!("{} ⚠️ 缺少区域 {}", ctx, region);
            issues.push(SheetIssue::MissingRegion { region });
        }

        // ========== 阶段 2: 外部识别 ==========
        info!("{} 🔍 正在识别 {} 个区域...", ctx, regions.len());
        let (marks, code, name, student_id, sequence) = tokio::join!(
            self.detect_marks(ctx, &regions),
            self.recognize(ctx, &regions, RegionName::CodeBox),
            self.recognize(ctx, &regions, RegionName::Name),
            self.recognize(ctx, &regions, RegionName::Id),
            self.recognize(ctx, &regions, RegionName::Index),
        );

        let detections = take_signal(ctx, marks, RegionName::GradingTable, &mut issues)
            .unwrap_or_default();
        let variant_code = take_signal(ctx, code, RegionName::CodeBox, &mut issues)
            .and_then(|raw| clean_variant_code(&raw));
        let signal = IdentitySignal::new(
            take_signal(ctx, name, RegionName::Name, &mut issues).and_then(|raw| clean_name(&raw)),
            take_signal(ctx, student_id, RegionName::Id, &mut issues)
                .and_then(|raw| clean_student_id(&raw)),
            take_signal(ctx, sequence, RegionName::Index, &mut issues)
                .and_then(|raw| clean_sequence_number(&raw)),
        );

        // ========== 阶段 3: 组卷 + 身份校正 ==========
        let assembler = self.assembler.clone();
        let question_count = self.question_count;
        let reconciler = Arc::clone(&self.reconciler);
        let (assembly, identity) = tokio::join!(
            tokio::task::spawn_blocking(move || assembler.assemble(&detections, question_count)),
            tokio::task::spawn_blocking(move || reconciler.reconcile(&signal)),
        );
        let assembly = assembly.context("组卷任务异常退出")?;
        let identity = identity.context("身份校正任务异常退出")?;

        match assembly.status {
            AssemblyStatus::Complete => {}
            AssemblyStatus::Ungradable { clusters } => {
                issues.push(SheetIssue::Ungradable { clusters });
            }
            AssemblyStatus::Padded { detected, expected }
            | AssemblyStatus::Truncated { detected, expected } => {
                issues.push(SheetIssue::AnswerCountMismatch { detected, expected });
            }
        }

        info!(
            "{} 👤 {} {} ({}): {}",
            ctx, identity.student_id, identity.name, identity.status, identity.reason
        );
        if identity.status != MatchStatus::ExactMatch {
            issues.push(SheetIssue::IdentityNotExact {
                status: identity.status,
            });
        }
        if !identity.is_complete() {
            issues.push(SheetIssue::IncompleteIdentity);
        }

        // ========== 阶段 4: 评分 ==========
        let score = match variant_code.as_deref() {
            Some(code) => {
                let outcome = self.scoring.score(&assembly.answers, code);
                match outcome.status {
                    ScoreStatus::Scored => {}
                    ScoreStatus::NoMatchingKey { code } => {
                        issues.push(SheetIssue::NoMatchingAnswerKey { code });
                    }
                    ScoreStatus::KeyLengthMismatch {
                        key_len,
                        answer_len,
                    } => {
                        issues.push(SheetIssue::KeyLengthMismatch {
                            key_len,
                            answer_len,
                        });
                    }
                }
                outcome.score
            }
            None => {
                warn!("{} ⚠️ 未识别出试卷代码，记 0 分", ctx);
                issues.push(SheetIssue::MissingVariantCode);
                0
            }
        };

        let scaled = scale_score(score, self.question_count, self.max_points);
        info!(
            "{} ✓ 试卷 {} 得分 {}/{} ({:.2})，问题 {} 个",
            ctx,
            variant_code.as_deref().unwrap_or("-"),
            score,
            self.question_count,
            scaled,
            issues.len()
        );

        Ok(GradingResult::new(
            ctx.file_name(),
            identity,
            variant_code.unwrap_or_default(),
            assembly.answers,
            score,
            scaled,
            issues,
        ))
    }

    /// 切图放到阻塞线程池；配置了裁剪图目录时顺便保存
    async fn segment(&self, ctx: &SheetCtx) -> Result<RegionSet> {
        let segmenter = Arc::clone(&self.segmenter);
        let path = ctx.path.clone();
        let save_dir = self.regions_folder.as_ref().map(|dir| dir.join(ctx.stem()));

        let (regions, save_result) = tokio::task::spawn_blocking(move || {
            let regions = segmenter.segment_file(&path);
            let saved = save_dir.map(|dir| regions.save_to_dir(&dir));
            (regions, saved)
        })
        .await
        .context("切图任务异常退出")?;

        if let Some(Err(e)) = save_result {
            warn!("{} ⚠️ 保存区域裁剪图失败: {}", ctx, e);
        }
        Ok(regions)
    }

    async fn detect_marks(
        &self,
        ctx: &SheetCtx,
        regions: &RegionSet,
    ) -> Option<RecognitionOutcome<Vec<Detection>>> {
        let request = request_for(ctx, regions, RegionName::GradingTable)?;
        Some(self.recognizers.detect_marks(request).await)
    }

    async fn recognize(
        &self,
        ctx: &SheetCtx,
        regions: &RegionSet,
        region: RegionName,
    ) -> Option<RecognitionOutcome<String>> {
        let request = request_for(ctx, regions, region)?;
        Some(self.recognizers.recognize_text(request).await)
    }
}

/// 区域缺失时不调用识别器（缺失已记为问题）
fn request_for(ctx: &SheetCtx, regions: &RegionSet, region: RegionName) -> Option<RecognitionRequest> {
    regions.get(region).map(|found| RecognitionRequest {
        source: ctx.path.clone(),
        region,
        image: found.image.clone(),
    })
}

/// 取出识别结果；超时或失败记为问题并按"没有识别到"处理
fn take_signal<T>(
    ctx: &SheetCtx,
    outcome: Option<RecognitionOutcome<T>>,
    region: RegionName,
    issues: &mut Vec<SheetIssue>,
) -> Option<T> {
    let outcome = outcome?;
    if let Some(issue) = outcome.issue(region) {
        warn!("{} ⚠️ {}", ctx, issue);
        issues.push(issue);
    }
    outcome.into_option()
}
