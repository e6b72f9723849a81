//! 身份校正服务 - 业务能力层
//!
//! 姓名、学号、序号三个信号各自独立且都不可靠，拿它们分别去名单里找候选行，
//! 再按"三票 → 两票 → 仅姓名"的优先级投票决定是哪位学生。

use crate::models::identity::{IdentitySignal, MatchStatus, ReconciledIdentity};
use crate::models::roster::{Roster, RosterEntry};
use crate::services::similarity::{ratio, ratio_ignore_case};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// 每一级投票的规则
const PAIR_RULES: [(Signal, Signal, &str); 3] = [
    (Signal::Name, Signal::Id, "name+ID matched, sequence corrected."),
    (
        Signal::Name,
        Signal::Sequence,
        "name+sequence matched, ID corrected.",
    ),
    (Signal::Id, Signal::Sequence, "ID+sequence matched, name corrected."),
];

#[derive(Debug, Clone, Copy)]
enum Signal {
    Name,
    Id,
    Sequence,
}

/// 每个信号命中的名单行
#[derive(Debug, Default)]
struct Candidates {
    name: BTreeSet<usize>,
    id: BTreeSet<usize>,
    sequence: BTreeSet<usize>,
    /// 每行的姓名相似度
    name_scores: Vec<u8>,
}

impl Candidates {
    fn set(&self, signal: Signal) -> &BTreeSet<usize> {
        match signal {
            Signal::Name => &self.name,
            Signal::Id => &self.id,
            Signal::Sequence => &self.sequence,
        }
    }
}

/// 身份校正服务
pub struct IdentityReconciler {
    roster: Arc<Roster>,
    name_threshold: u8,
    id_threshold: u8,
}

impl IdentityReconciler {
    pub fn new(roster: Arc<Roster>, name_threshold: u8, id_threshold: u8) -> Self {
        Self {
            roster,
            name_threshold,
            id_threshold,
        }
    }

    /// 按优先级匹配名单；永远返回结果，匹配不上时原样返回识别值
    pub fn reconcile(&self, signal: &IdentitySignal) -> ReconciledIdentity {
        let candidates = self.collect_candidates(signal);
        debug!(
            "候选行 姓名: {:?} 学号: {:?} 序号: {:?}",
            candidates.name, candidates.id, candidates.sequence
        );

        let all_three: Vec<usize> = candidates
            .name
            .iter()
            .filter(|row| candidates.id.contains(row) && candidates.sequence.contains(row))
            .copied()
            .collect();
        if let Some(row) = self.pick(&all_three) {
            return self.resolve(row, MatchStatus::ExactMatch, "all three signals matched.");
        }

        for (a, b, reason) in PAIR_RULES {
            let both: Vec<usize> = candidates
                .set(a)
                .intersection(candidates.set(b))
                .copied()
                .collect();
            if let Some(row) = self.pick(&both) {
                return self.resolve(row, MatchStatus::AutoCorrected, reason);
            }
        }

        if let Some(best_score) = candidates
            .name
            .iter()
            .map(|row| candidates.name_scores[*row])
            .max()
        {
            let best: Vec<usize> = candidates
                .name
                .iter()
                .filter(|row| candidates.name_scores[**row] == best_score)
                .copied()
                .collect();
            if let Some(row) = self.pick(&best) {
                return self.resolve(
                    row,
                    MatchStatus::AutoCorrected,
                    "name-only match; ID and sequence corrected.",
                );
            }
        }

        ReconciledIdentity {
            name: signal.name().to_string(),
            student_id: signal.student_id().to_string(),
            sequence_number: signal.sequence_number().to_string(),
            status: MatchStatus::NoMatch,
            reason: "no matching roster entry.".to_string(),
            roster_row: None,
        }
    }

    fn collect_candidates(&self, signal: &IdentitySignal) -> Candidates {
        let mut candidates = Candidates {
            name_scores: vec![0; self.roster.len()],
            ..Default::default()
        };

        for (row, entry) in self.roster.entries().iter().enumerate() {
            if let Some(name) = signal.name.as_deref() {
                // 全名只在这里临时计算，不写回名单
                let score = ratio_ignore_case(name, &entry.full_name());
                candidates.name_scores[row] = score;
                if score >= self.name_threshold {
                    candidates.name.insert(row);
                }
            }
            if let Some(id) = signal.student_id.as_deref() {
                if ratio(id.trim(), entry.student_id.trim()) >= self.id_threshold {
                    candidates.id.insert(row);
                }
            }
            if let Some(seq) = signal.sequence_number.as_deref() {
                if seq.trim() == entry.sequence_number.trim() {
                    candidates.sequence.insert(row);
                }
            }
        }

        candidates
    }

    /// 同一级有多行命中时：序号最小的优先，再按名单顺序
    fn pick(&self, rows: &[usize]) -> Option<usize> {
        let entries = self.roster.entries();
        rows.iter()
            .copied()
            .min_by(|a, b| entries[*a].cmp_sequence(&entries[*b]).then(a.cmp(b)))
    }

    fn resolve(&self, row: usize, status: MatchStatus, reason: &str) -> ReconciledIdentity {
        let entry: &RosterEntry = &self.roster.entries()[row];
        debug!("匹配到名单第 {} 行: {} ({})", row + 1, entry.student_id, reason);
        ReconciledIdentity {
            name: entry.full_name(),
            student_id: entry.student_id.clone(),
            sequence_number: entry.sequence_number.clone(),
            status,
            reason: reason.to_string(),
            roster_row: Some(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Arc<Roster> {
        let rows = [
            ("1", "2100701", "Le Van", "Cuong"),
            ("2", "2100702", "Pham Thi", "Dung"),
            ("3", "2100703", "Hoang Van", "Em"),
            ("4", "2100704", "Vo Thi", "Giang"),
            ("5", "2100738", "Nguyen Van", "An"),
            ("6", "2100806", "Bui Van", "Hung"),
            ("7", "2100807", "Dang Thi", "Khanh"),
            ("8", "2100808", "Do Van", "Long"),
            ("9", "2199999", "Tran Thi", "Binh"),
        ];
        Arc::new(Roster::new(
            rows.iter()
                .map(|(s, id, f, g)| RosterEntry::new(*s, *id, *f, *g).unwrap())
                .collect(),
        ))
    }

    fn reconciler() -> IdentityReconciler {
        IdentityReconciler::new(roster(), 70, 80)
    }

    fn signal(name: &str, id: &str, seq: &str) -> IdentitySignal {
        IdentitySignal::new(Some(name.into()), Some(id.into()), Some(seq.into()))
    }

    #[test]
    fn test_exact_match_overwrites_with_roster_values() {
        let result = reconciler().reconcile(&signal("nguyen van an", "2100738", "5"));
        assert_eq!(result.status, MatchStatus::ExactMatch);
        assert_eq!(result.name, "Nguyen Van An");
        assert_eq!(result.roster_row, Some(4));
    }

    #[test]
    fn test_name_and_id_correct_sequence() {
        let result = reconciler().reconcile(&signal("Nguyen Van An", "2100738", "12"));
        assert_eq!(result.status, MatchStatus::AutoCorrected);
        assert_eq!(result.reason, "name+ID matched, sequence corrected.");
        assert_eq!(result.sequence_number, "5");
    }

    #[test]
    fn test_id_and_sequence_correct_name() {
        let result = reconciler().reconcile(&signal("Xyz", "2199999", "9"));
        assert_eq!(result.status, MatchStatus::AutoCorrected);
        assert_eq!(result.reason, "ID+sequence matched, name corrected.");
        assert_eq!(result.name, "Tran Thi Binh");
    }

    #[test]
    fn test_name_only_when_id_points_elsewhere() {
        // 姓名指向第 5 行，学号指向第 9 行，序号为空
        let signal = IdentitySignal::new(
            Some("Nguyen Van An".into()),
            Some("2199999".into()),
            None,
        );
        let result = reconciler().reconcile(&signal);
        assert_eq!(result.status, MatchStatus::AutoCorrected);
        assert_eq!(result.reason, "name-only match; ID and sequence corrected.");
        assert_eq!(result.student_id, "2100738");
        assert_eq!(result.sequence_number, "5");
    }

    #[test]
    fn test_three_different_rows_never_exact() {
        // 姓名 → 第 5 行，学号 → 第 9 行，序号 → 第 1 行
        let result = reconciler().reconcile(&signal("Nguyen Van An", "2199999", "1"));
        assert_ne!(result.status, MatchStatus::ExactMatch);
        assert_eq!(result.roster_row, Some(4));
    }

    #[test]
    fn test_no_match_keeps_raw_values() {
        let result = reconciler().reconcile(&signal("Zzzz", "9999", "77"));
        assert_eq!(result.status, MatchStatus::NoMatch);
        assert_eq!(result.name, "Zzzz");
        assert_eq!(result.student_id, "9999");
        assert_eq!(result.reason, "no matching roster entry.");

        let empty = reconciler().reconcile(&IdentitySignal::default());
        assert_eq!(empty.status, MatchStatus::NoMatch);
        assert_eq!(empty.name, "");
    }

    #[test]
    fn test_ties_prefer_lowest_sequence_number() {
        // 2100806/2100807/2100808 互相相似度都 >= 80
        let signal = IdentitySignal::new(None, Some("2100807".into()), Some("".into()));
        let by_id_only = reconciler().reconcile(&signal);
        // 只有学号命中不构成任何一级
        assert_eq!(by_id_only.status, MatchStatus::NoMatch);

        let rows = vec![
            RosterEntry::new("12", "A1", "Tran", "Binh").unwrap(),
            RosterEntry::new("3", "B2", "Tran", "Binh").unwrap(),
        ];
        let reconciler = IdentityReconciler::new(Arc::new(Roster::new(rows)), 70, 80);
        let result = reconciler.reconcile(&IdentitySignal::new(Some("Tran Binh".into()), None, None));
        assert_eq!(result.sequence_number, "3");
        assert_eq!(result.roster_row, Some(1));
    }
}
