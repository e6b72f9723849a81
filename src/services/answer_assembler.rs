//! 组卷服务 - 业务能力层
//!
//! 把检测器给出的一堆无序检测框整理成按题号排列的答案序列：
//! 聚类去重 → 每簇选代表 → 按列切分 → 列内按行排序 → 拼接 → 按题数补齐/截断。

use crate::models::answers::AssembledAnswers;
use crate::models::detection::{AnswerCluster, Detection};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// 组卷状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyStatus {
    /// 题数正好
    Complete,
    /// 识别到的题目少于题数，末尾补空
    Padded { detected: usize, expected: usize },
    /// 识别到的题目多于题数，截掉末尾
    Truncated { detected: usize, expected: usize },
    /// 聚类数少于列数，整张卡无法组卷
    Ungradable { clusters: usize },
}

/// 组卷结果，`answers` 的长度总是等于题数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub answers: AssembledAnswers,
    pub status: AssemblyStatus,
}

/// 组卷服务
#[derive(Debug, Clone)]
pub struct AnswerAssembler {
    cluster_radius: f32,
    column_count: usize,
}

impl AnswerAssembler {
    pub fn new(cluster_radius: f32, column_count: usize) -> Self {
        Self {
            cluster_radius,
            column_count: column_count.max(1),
        }
    }

    /// 组卷，结果与输入顺序无关
    pub fn assemble(&self, detections: &[Detection], question_count: usize) -> Assembly {
        let clusters = self.cluster(detections);
        debug!("{} 个检测框聚成 {} 簇", detections.len(), clusters.len());

        if clusters.len() < self.column_count {
            warn!(
                "只有 {} 个答案簇（少于 {} 列），无法组卷",
                clusters.len(),
                self.column_count
            );
            return Assembly {
                answers: AssembledAnswers::empty(question_count),
                status: AssemblyStatus::Ungradable {
                    clusters: clusters.len(),
                },
            };
        }

        let ordered = self.order_by_columns(&clusters);
        let detected = ordered.len();
        let status = match detected.cmp(&question_count) {
            Ordering::Equal => AssemblyStatus::Complete,
            Ordering::Less => AssemblyStatus::Padded {
                detected,
                expected: question_count,
            },
            Ordering::Greater => AssemblyStatus::Truncated {
                detected,
                expected: question_count,
            },
        };
        if status != AssemblyStatus::Complete {
            warn!("识别到 {} 题，题数为 {}，已补齐/截断", detected, question_count);
        }

        Assembly {
            answers: AssembledAnswers::fitted(ordered, question_count),
            status,
        }
    }

    /// 单链接聚类：中心距离不超过半径的检测框连成一簇
    pub fn cluster(&self, detections: &[Detection]) -> Vec<AnswerCluster> {
        let sorted = canonical_order(detections);
        let mut used = vec![false; sorted.len()];
        let mut clusters = Vec::new();

        for seed in 0..sorted.len() {
            if used[seed] {
                continue;
            }
            used[seed] = true;
            let mut members = vec![seed];
            let mut frontier = VecDeque::from([seed]);

            while let Some(current) = frontier.pop_front() {
                for candidate in 0..sorted.len() {
                    if !used[candidate]
                        && sorted[current].bbox.center_distance(&sorted[candidate].bbox)
                            <= self.cluster_radius
                    {
                        used[candidate] = true;
                        members.push(candidate);
                        frontier.push_back(candidate);
                    }
                }
            }

            let members: Vec<Detection> = members.into_iter().map(|i| sorted[i].clone()).collect();
            clusters.push(choose_representative(members));
        }

        clusters
    }

    /// 按 x 切成若干列，每列内按 y 排序，再按列拼接
    fn order_by_columns(&self, clusters: &[AnswerCluster]) -> Vec<String> {
        let mut reps: Vec<(&Detection, char)> = clusters
            .iter()
            .map(|c| (c.representative(), c.letter))
            .collect();
        reps.sort_by(|a, b| a.0.bbox.x1.total_cmp(&b.0.bbox.x1));

        let n = reps.len();
        let base = n / self.column_count;
        let mut ordered = Vec::with_capacity(n);
        let mut start = 0;
        for column in 0..self.column_count {
            let end = if column + 1 == self.column_count {
                n
            } else {
                start + base
            };
            let mut group = reps[start..end].to_vec();
            group.sort_by(|a, b| a.0.bbox.y1.total_cmp(&b.0.bbox.y1));
            debug!("第 {} 列: {} 题", column + 1, group.len());
            ordered.extend(group.into_iter().map(|(_, letter)| letter.to_string()));
            start = end;
        }
        ordered
    }
}

/// 固定的全序，使聚类和排序不依赖检测器的输出顺序
fn canonical_order(detections: &[Detection]) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| {
        a.bbox
            .x1
            .total_cmp(&b.bbox.x1)
            .then(a.bbox.y1.total_cmp(&b.bbox.y1))
            .then(a.bbox.x2.total_cmp(&b.bbox.x2))
            .then(a.bbox.y2.total_cmp(&b.bbox.y2))
            .then_with(|| a.label.cmp(&b.label))
            .then(a.confidence.total_cmp(&b.confidence))
    });
    sorted
}

/// 出现最多的选项字母（并列取先出现的），再取该字母里置信度最高的检测
fn choose_representative(members: Vec<Detection>) -> AnswerCluster {
    let mut counts: Vec<(char, usize)> = Vec::new();
    for member in &members {
        let letter = member.option_letter();
        match counts.iter_mut().find(|(c, _)| *c == letter) {
            Some((_, count)) => *count += 1,
            None => counts.push((letter, 1)),
        }
    }

    let mut letter = counts.first().map(|(c, _)| *c).unwrap_or(' ');
    let mut best = 0;
    for (c, count) in &counts {
        if *count > best {
            best = *count;
            letter = *c;
        }
    }

    let mut representative = 0;
    for (idx, member) in members.iter().enumerate() {
        if member.option_letter() != letter {
            continue;
        }
        let current = &members[representative];
        if current.option_letter() != letter || member.confidence > current.confidence {
            representative = idx;
        }
    }

    AnswerCluster {
        members,
        representative,
        letter,
    }
}
