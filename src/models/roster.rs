use crate::error::{AppResult, DataError};
use crate::models::answer_key::deserialize_loose_string;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 单个考场最多容纳的学生数，超过就拆成多个考场
const ROOM_CAPACITY: usize = 45;
/// 最多拆成的考场数
const MAX_ROOMS: usize = 3;

/// 名单中的一行学生信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// 序号（STT）
    #[serde(alias = "stt", deserialize_with = "deserialize_loose_string")]
    pub sequence_number: String,
    /// 学号（MSSV）
    #[serde(alias = "mssv", deserialize_with = "deserialize_loose_string")]
    pub student_id: String,
    /// 姓（含中间名）
    #[serde(alias = "ho_dem", default)]
    pub family_name: String,
    /// 名
    #[serde(alias = "ten", default)]
    pub given_name: String,
}

impl RosterEntry {
    /// 创建名单行，序号和学号必填
    pub fn new(
        sequence_number: impl Into<String>,
        student_id: impl Into<String>,
        family_name: impl Into<String>,
        given_name: impl Into<String>,
    ) -> AppResult<Self> {
        let entry = Self {
            sequence_number: sequence_number.into().trim().to_string(),
            student_id: student_id.into().trim().to_string(),
            family_name: family_name.into().trim().to_string(),
            given_name: given_name.into().trim().to_string(),
        };
        entry.validate()?;
        Ok(entry)
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.sequence_number.trim().is_empty() {
            return Err(DataError::EmptyField {
                record: "RosterEntry",
                field: "sequence_number",
            }
            .into());
        }
        if self.student_id.trim().is_empty() {
            return Err(DataError::EmptyField {
                record: "RosterEntry",
                field: "student_id",
            }
            .into());
        }
        Ok(())
    }

    /// 全名 = 姓 + 空格 + 名（临时计算，不写回名单）
    pub fn full_name(&self) -> String {
        let family = self.family_name.trim();
        let given = self.given_name.trim();
        match (family.is_empty(), given.is_empty()) {
            (true, true) => String::new(),
            (true, false) => given.to_string(),
            (false, true) => family.to_string(),
            (false, false) => format!("{} {}", family, given),
        }
    }

    /// 按序号比较：都是数字时按数值，否则按字符串
    pub fn cmp_sequence(&self, other: &RosterEntry) -> Ordering {
        match (
            self.sequence_number.parse::<u64>(),
            other.sequence_number.parse::<u64>(),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => self.sequence_number.cmp(&other.sequence_number),
        }
    }
}

/// 一个考场（或整个班级）的学生名单，只读
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn get(&self, row: usize) -> Option<&RosterEntry> {
        self.entries.get(row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 需要的考场数：≤45 人一个，≤90 人两个，否则三个
    pub fn room_count(&self) -> usize {
        let n = self.entries.len();
        if n <= ROOM_CAPACITY {
            1
        } else if n <= ROOM_CAPACITY * 2 {
            2
        } else {
            MAX_ROOMS
        }
    }

    /// 按考场连续拆分，前 `n % k` 个考场多分一人
    pub fn split_into_parts(&self) -> Vec<Roster> {
        let parts = self.room_count();
        let base = self.entries.len() / parts;
        let remainder = self.entries.len() % parts;

        let mut result = Vec::with_capacity(parts);
        let mut start = 0;
        for i in 0..parts {
            let size = base + usize::from(i < remainder);
            result.push(Roster::new(self.entries[start..start + size].to_vec()));
            start += size;
        }
        result
    }

    /// 根据考场名称中的数字选择对应的名单分段，找不到就用第一段
    pub fn select_part(&self, room: &str) -> Roster {
        let mut parts = self.split_into_parts();
        let index = room_number(room)
            .and_then(|n| n.checked_sub(1))
            .filter(|idx| *idx < parts.len())
            .unwrap_or_else(|| {
                tracing::info!("考场 {} 没有对应的名单分段，使用第 1 段", room);
                0
            });
        parts.swap_remove(index)
    }
}

/// 从 `Phong2` / `A3` / `2` 这类考场名中取出数字
fn room_number(room: &str) -> Option<usize> {
    let re = Regex::new(r"\d+").ok()?;
    re.find(room).and_then(|m| m.as_str().parse().ok())
}
