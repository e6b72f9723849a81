//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量答题卡处理器
//! - 管理应用生命周期（初始化、运行）
//! - 一次性加载答案表和名单，之后只读共享
//! - 控制并发数量（Semaphore），支持取消
//! - 输出全局统计信息
//!
//! ### `sheet_processor` - 单张答题卡处理器
//! - 委托 SheetFlow 处理一张卡
//! - 把单张卡的失败隔离成一条带问题的结果
//! - 登记需要人工复核的卡
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<图片>)
//!     ↓
//! sheet_processor (处理单张卡，隔离失败)
//!     ↓
//! workflow::SheetFlow (切图 → 识别 → 组卷/身份 → 评分)
//!     ↓
//! services (能力层：切图 / 组卷 / 评分 / 身份校正 / 复核清单)
//!     ↓
//! infrastructure (基础设施：注入的识别器)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，sheet_processor 管单张
//! 2. **共享只读**：答案表和名单用 Arc 共享，处理过程中不修改
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;
pub mod sheet_processor;

// 重新导出主要类型
pub use batch_processor::{App, BatchReport, BatchStats, CancelHandle};
pub use sheet_processor::process_sheet;
