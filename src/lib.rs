//! # Answer Sheet Grader
//!
//! 批量批改扫描答题卡的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部识别模型的注入点，只暴露能力
//! - `Recognizers` - 涂卡检测 + 文字识别，每次调用都带超时
//! - `SidecarRecognizer` - 从图片旁边的 `.recognition.toml` 读取识别结果
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单张卡
//! - `RegionSegmenter` - 转正、二值化、切出五个区域
//! - `AnswerAssembler` - 把检测框聚类并排成答案序列
//! - `ScoringEngine` - 按试卷代码对答案评分
//! - `IdentityReconciler` - 用名单校正姓名 / 学号 / 序号
//! - `ReviewWriter` - 写 review.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张卡"的完整处理流程
//! - `SheetCtx` - 上下文封装（图片路径 + 序号）
//! - `SheetFlow` - 流程编排（切图 → 识别 → 组卷/身份 → 评分）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理资源、并发和取消
//! - `orchestrator/sheet_processor` - 单张卡处理器，隔离失败
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{MarkDetector, Recognizers, SidecarRecognizer, TextRecognizer};
pub use models::{AnswerKeyTable, GradingResult, Roster, SheetIssue};
pub use orchestrator::{process_sheet, App, BatchReport, BatchStats, CancelHandle};
pub use workflow::{SheetCtx, SheetFlow};
