//! 识别文字清洗
//!
//! 手写识别返回的是自由文本，这里把它们整理成各字段期望的形状。
//! 清洗后为空就当作没有识别到。

use regex::Regex;

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// 试卷代码：第一段连续数字
pub fn clean_variant_code(raw: &str) -> Option<String> {
    let re = Regex::new(r"\d+").ok()?;
    re.find(raw).map(|m| m.as_str().to_string())
}

/// 学号：转大写，只保留字母和数字
pub fn clean_student_id(raw: &str) -> Option<String> {
    non_empty(
        raw.to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect(),
    )
}

/// 序号：第一个独立的一到两位数字
pub fn clean_sequence_number(raw: &str) -> Option<String> {
    let re = Regex::new(r"\b\d{1,2}\b").ok()?;
    re.find(raw).map(|m| m.as_str().to_string())
}

/// 姓名：去掉首尾空白，连续空白合并为一个空格
pub fn clean_name(raw: &str) -> Option<String> {
    let re = Regex::new(r"\s+").ok()?;
    non_empty(re.replace_all(raw.trim(), " ").into_owned())
}
