use std::fmt;

use getset::{CopyGetters, Getters};

/// 整个数据集的汇总结果
#[derive(Getters, CopyGetters, Clone, Debug, PartialEq)]
pub struct DatasetSummary {
    /// 标题, 例如 `MiddV3 Dataset - SDR`
    #[getset(get = "pub")]
    title: String,
    /// 生成时间 `%Y-%m-%d %H:%M`
    #[getset(get = "pub")]
    timestamp: String,
    /// 参与汇总的条目数
    #[getset(get_copy = "pub")]
    item_count: usize,
    /// 各类别 MAE 均值: 全部有效, 类别 1, 类别 2, 类别 3
    #[getset(get = "pub")]
    mae: [f64; 4],
    /// 各类别 RMSE 均值
    #[getset(get = "pub")]
    rmse: [f64; 4],
    /// 各类别实际参与均值计算的条目数(跳过空类别后)
    #[getset(get = "pub")]
    category_counts: [usize; 4],
    /// Bad4 均值(%)
    #[getset(get_copy = "pub")]
    bad4: f64,
    /// Bad2 均值(%)
    #[getset(get_copy = "pub")]
    bad2: f64,
}

impl DatasetSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: &str,
        timestamp: &str,
        item_count: usize,
        mae: [f64; 4],
        rmse: [f64; 4],
        category_counts: [usize; 4],
        bad4: f64,
        bad2: f64,
    ) -> Self {
        Self {
            title: title.to_string(),
            timestamp: timestamp.to_string(),
            item_count,
            mae,
            rmse,
            category_counts,
            bad4,
            bad2,
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "============================")?;
        writeln!(f, "Evaluation Results:")?;
        writeln!(f, "{}", self.timestamp)?;
        writeln!(f, "============================")?;
        writeln!(f, "{}", self.title)?;
        writeln!(f)?;
        writeln!(f, "MAE:")?;
        for c in 1..4 {
            writeln!(f, "  Category {}: {:.3}", c, self.mae[c])?;
        }
        writeln!(f, "  Whole GT: {:.3}", self.mae[0])?;
        writeln!(f)?;
        writeln!(f, "RMSE:")?;
        for c in 1..4 {
            writeln!(f, "  Category {}: {:.3}", c, self.rmse[c])?;
        }
        writeln!(f, "  Whole GT: {:.3}", self.rmse[0])?;
        writeln!(f)?;
        writeln!(f, "Bad4: {:.2}%", self.bad4)?;
        writeln!(f, "Bad2: {:.2}%", self.bad2)
    }
}
