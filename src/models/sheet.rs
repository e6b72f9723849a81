use crate::error::{AppError, AppResult};
use crate::models::geometry::Rect;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 一张答题卡照片（三通道），加载后只读
#[derive(Debug, Clone)]
pub struct SheetImage {
    pixels: RgbImage,
}

impl SheetImage {
    /// 从文件读取
    pub fn open(path: &Path) -> AppResult<Self> {
        let dynamic =
            image::open(path).map_err(|e| AppError::image_decode_failed(path.display().to_string(), e))?;
        Ok(Self {
            pixels: dynamic.to_rgb8(),
        })
    }

    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// 答题卡上有语义的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionName {
    /// 试卷代码框
    CodeBox,
    /// 姓名
    Name,
    /// 学号
    Id,
    /// 序号
    Index,
    /// 答题区
    GradingTable,
}

impl RegionName {
    pub const ALL: [RegionName; 5] = [
        RegionName::CodeBox,
        RegionName::Name,
        RegionName::Id,
        RegionName::Index,
        RegionName::GradingTable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegionName::CodeBox => "code_box",
            RegionName::Name => "name",
            RegionName::Id => "id",
            RegionName::Index => "index",
            RegionName::GradingTable => "grading_table",
        }
    }
}

impl std::fmt::Display for RegionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 裁剪出来的区域图像及其在校正图中的位置
#[derive(Debug, Clone)]
pub struct Region {
    pub image: RgbImage,
    pub rect: Rect,
}

/// 一张答题卡切出来的所有区域
///
/// 缺失的 key 表示“这张卡这个字段跳过”，由下游记为问题，不中断流程。
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: BTreeMap<RegionName, Region>,
}

impl RegionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: RegionName, region: Region) {
        self.regions.insert(name, region);
    }

    pub fn get(&self, name: RegionName) -> Option<&Region> {
        self.regions.get(&name)
    }

    pub fn contains(&self, name: RegionName) -> bool {
        self.regions.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// 没切出来的区域（按固定顺序）
    pub fn missing(&self) -> Vec<RegionName> {
        RegionName::ALL
            .iter()
            .copied()
            .filter(|name| !self.contains(*name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionName, &Region)> {
        self.regions.iter().map(|(name, region)| (*name, region))
    }

    /// 把每个区域保存为 `<dir>/<region>.jpg`
    pub fn save_to_dir(&self, dir: &Path) -> AppResult<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::file_write_failed(dir.display().to_string(), e))?;

        for (name, region) in self.iter() {
            let path = dir.join(format!("{}.jpg", name.as_str()));
            region
                .image
                .save(&path)
                .map_err(|e| AppError::image_encode_failed(path.display().to_string(), e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(w: u32, h: u32) -> Region {
        Region {
            image: RgbImage::new(w, h),
            rect: Rect::new(0, 0, w, h),
        }
    }

    #[test]
    fn test_missing_regions_in_fixed_order() {
        let mut set = RegionSet::empty();
        assert_eq!(set.missing(), RegionName::ALL.to_vec());

        set.insert(RegionName::Name, region(4, 4));
        set.insert(RegionName::GradingTable, region(8, 8));
        assert_eq!(
            set.missing(),
            vec![RegionName::CodeBox, RegionName::Id, RegionName::Index]
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_save_to_dir_writes_one_file_per_region() {
        let dir = std::env::temp_dir().join(format!("regions-{}", std::process::id()));
        let mut set = RegionSet::empty();
        set.insert(RegionName::CodeBox, region(6, 6));
        set.insert(RegionName::Index, region(6, 3));

        set.save_to_dir(&dir).unwrap();

        assert!(dir.join("code_box.jpg").exists());
        assert!(dir.join("index.jpg").exists());
        assert!(!dir.join("name.jpg").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
