use crate::models::layout::SheetLayout;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的答题卡数量
    pub max_concurrent_sheets: usize,
    /// 答题卡图片目录
    pub images_folder: String,
    /// 答案表 TOML
    pub answer_key_file: String,
    /// 学生名单 TOML
    pub roster_file: String,
    /// 考场名称（如 `Phong2`），为空时使用整份名单
    pub exam_room: Option<String>,
    /// 批改结果 JSON
    pub results_file: String,
    /// 待人工复核列表
    pub review_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 设置后，每张卡的区域裁剪图保存到 `<目录>/<图片名>/`
    pub regions_folder: Option<String>,
    /// 版式 TOML，未设置时使用默认模板
    pub layout_file: Option<String>,
    // --- 识别与匹配参数 ---
    /// 单次识别调用的超时（毫秒）
    pub recognizer_timeout_ms: u64,
    /// 同一标记的检测框中心距离上限（像素）
    pub cluster_radius_px: f32,
    pub name_match_threshold: u8,
    pub id_match_threshold: u8,
    /// 满分（用于换算分数）
    pub max_points: f64,
    pub layout: SheetLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_sheets: 4,
            images_folder: "uploads/images".to_string(),
            answer_key_file: "answer_key.toml".to_string(),
            roster_file: "roster.toml".to_string(),
            exam_room: None,
            results_file: "results.json".to_string(),
            review_file: "review.txt".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            regions_folder: None,
            layout_file: None,
            recognizer_timeout_ms: 10_000,
            cluster_radius_px: 20.0,
            name_match_threshold: 70,
            id_match_threshold: 80,
            max_points: 10.0,
            layout: SheetLayout::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_sheets: std::env::var("MAX_CONCURRENT_SHEETS").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.max_concurrent_sheets),
            images_folder: std::env::var("IMAGES_FOLDER").unwrap_or(default.images_folder),
            answer_key_file: std::env::var("ANSWER_KEY_FILE").unwrap_or(default.answer_key_file),
            roster_file: std::env::var("ROSTER_FILE").unwrap_or(default.roster_file),
            exam_room: std::env::var("EXAM_ROOM").ok().filter(|v| !v.trim().is_empty()),
            results_file: std::env::var("RESULTS_FILE").unwrap_or(default.results_file),
            review_file: std::env::var("REVIEW_FILE").unwrap_or(default.review_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            regions_folder: std::env::var("REGIONS_FOLDER").ok().filter(|v| !v.trim().is_empty()),
            layout_file: std::env::var("LAYOUT_FILE").ok().filter(|v| !v.trim().is_empty()),
            recognizer_timeout_ms: std::env::var("RECOGNIZER_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recognizer_timeout_ms),
            cluster_radius_px: std::env::var("CLUSTER_RADIUS_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cluster_radius_px),
            name_match_threshold: std::env::var("NAME_MATCH_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.name_match_threshold),
            id_match_threshold: std::env::var("ID_MATCH_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.id_match_threshold),
            max_points: std::env::var("MAX_POINTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_points),
            layout: default.layout,
        }
    }

    pub fn recognizer_timeout(&self) -> Duration {
        Duration::from_millis(self.recognizer_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_concurrent_sheets, 4);
        assert_eq!(config.recognizer_timeout(), Duration::from_secs(10));
        assert_eq!(config.layout.column_count, 3);
        assert!(config.exam_room.is_none());
    }
}
