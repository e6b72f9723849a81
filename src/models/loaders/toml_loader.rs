use crate::error::{AppError, DataError, FileError};
use crate::models::answer_key::{AnswerKeyEntry, AnswerKeyTable};
use crate::models::layout::SheetLayout;
use crate::models::roster::{Roster, RosterEntry};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct AnswerKeyFile {
    #[serde(default)]
    variants: Vec<AnswerKeyEntry>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    students: Vec<RosterEntry>,
}

async fn read_toml(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(AppError::from(FileError::NotFound {
            path: path.display().to_string(),
        })
        .into());
    }
    fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
        .with_context(|| format!("无法读取TOML文件: {}", path.display()))
}

/// 从 TOML 文件加载答案表
///
/// 加载时一次性校验：不能为空、代码不能重复、各套题数必须一致。
pub async fn load_answer_key(path: &Path) -> Result<AnswerKeyTable> {
    let content = read_toml(path).await?;
    parse_answer_key(&content).with_context(|| format!("答案表不合法: {}", path.display()))
}

pub fn parse_answer_key(content: &str) -> Result<AnswerKeyTable> {
    let file: AnswerKeyFile = toml::from_str(content).context("无法解析答案表")?;
    let table = AnswerKeyTable::new(file.variants)?;
    table.check_uniform_length()?;
    tracing::info!(
        "成功加载答案表: {} 套试卷，每套 {} 题",
        table.codes().len(),
        table.question_count()
    );
    Ok(table)
}

/// 从 TOML 文件加载学生名单
pub async fn load_roster(path: &Path) -> Result<Roster> {
    let content = read_toml(path).await?;
    parse_roster(&content).with_context(|| format!("名单不合法: {}", path.display()))
}

pub fn parse_roster(content: &str) -> Result<Roster> {
    let file: RosterFile = toml::from_str(content).context("无法解析名单")?;
    if file.students.is_empty() {
        return Err(DataError::EmptyRoster.into());
    }
    for (row, entry) in file.students.iter().enumerate() {
        entry
            .validate()
            .with_context(|| format!("名单第 {} 行", row + 1))?;
    }
    tracing::info!("成功加载名单: {} 名学生", file.students.len());
    Ok(Roster::new(file.students))
}

/// 加载版式描述（缺省字段取默认值）
pub async fn load_layout(path: &Path) -> Result<SheetLayout> {
    let content = read_toml(path).await?;
    let layout: SheetLayout = toml::from_str(&content).map_err(|e| {
        AppError::from(FileError::TomlParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })?;
    layout.validate()?;
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_key() {
        let table = parse_answer_key(
            r#"
[[variants]]
code = 101
answers = ["A", "B", "C", "D"]

[[variants]]
code = "212.0"
answers = ["D", "C", "B", "A"]
"#,
        )
        .unwrap();
        assert_eq!(table.codes(), vec!["101", "212"]);
        assert_eq!(table.question_count(), 4);
    }

    #[test]
    fn test_answer_key_rejects_inconsistent_lengths() {
        let err = parse_answer_key(
            "[[variants]]\ncode = 1\nanswers = [\"A\"]\n[[variants]]\ncode = 2\nanswers = [\"A\", \"B\"]\n",
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("2"));
        assert!(parse_answer_key("").is_err());
    }

    #[test]
    fn test_parse_roster_with_aliases() {
        let roster = parse_roster(
            r#"
[[students]]
stt = 1
mssv = 2100738
ho_dem = "Nguyen Van"
ten = "An"

[[students]]
sequence_number = "2"
student_id = "2100739"
family_name = "Tran"
given_name = "Binh"
"#,
        )
        .unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.entries()[0].student_id, "2100738");
        assert_eq!(roster.entries()[0].full_name(), "Nguyen Van An");
        assert_eq!(roster.entries()[1].sequence_number, "2");
    }

    #[test]
    fn test_roster_rejects_blank_ids() {
        assert!(parse_roster("students = []").is_err());
        assert!(parse_roster("[[students]]\nstt = 1\nmssv = \" \"\n").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = load_roster(Path::new("/nonexistent/roster.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("roster.toml"));
    }
}
