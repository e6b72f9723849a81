//! 字符串相似度
//!
//! 0..=100 的比例分：`round(200 * LCS / (len_a + len_b))`，即基于插入/删除编辑距离的相似度。
//! 按字符（而不是字节）计算，越南语、中文姓名都适用。

/// 两个字符串的相似度，任何一边为空都返回 0
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let common = lcs_len(&a, &b);
    let score = (200.0 * common as f64 / total as f64).round();
    score.clamp(0.0, 100.0) as u8
}

/// 忽略大小写和首尾空白的相似度
pub fn ratio_ignore_case(a: &str, b: &str) -> u8 {
    ratio(&a.trim().to_lowercase(), &b.trim().to_lowercase())
}

/// 最长公共子序列长度（滚动数组）
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(ratio("2100738", "2100738"), 100);
        assert_eq!(ratio("", "2100738"), 0);
        assert_eq!(ratio("", ""), 0);
    }

    #[test]
    fn test_partial_similarity() {
        // LCS("2100738", "2100788") = 6
        assert_eq!(ratio("2100738", "2100788"), 86);
        // LCS("abcd", "abxy") = 2
        assert_eq!(ratio("abcd", "abxy"), 50);
    }

    #[test]
    fn test_case_insensitive_names() {
        assert_eq!(ratio_ignore_case("NGUYEN VAN AN", " nguyen van an"), 100);
        assert!(ratio_ignore_case("Nguyen Van Anh", "Nguyen Van An") >= 70);
        assert!(ratio_ignore_case("Tran Thi Binh", "Nguyen Van An") < 70);
    }

    #[test]
    fn test_non_ascii_counts_chars() {
        assert_eq!(ratio("Nguyễn", "Nguyễn"), 100);
        assert_eq!(ratio("Nguyễn", "Nguyen"), 83);
    }
}
