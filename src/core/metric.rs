use getset::{CopyGetters, Getters};

/// 单个条目的评估指标
///
/// mae / rmse 依次为: 全部有效像素, 类别 1, 类别 2, 类别 3.
/// 某类别没有像素时对应值为 NaN.
#[derive(Getters, CopyGetters, Copy, Clone, Debug, PartialEq)]
pub struct MetricTuple {
    /// 平均绝对误差
    #[getset(get = "pub")]
    mae: [f64; 4],
    /// 均方根误差
    #[getset(get = "pub")]
    rmse: [f64; 4],
    /// 误差大于 4 像素的有效像素比例 (0 ~ 1)
    #[getset(get_copy = "pub")]
    bad4: f64,
    /// 误差大于 2 像素的有效像素比例 (0 ~ 1)
    #[getset(get_copy = "pub")]
    bad2: f64,
}

impl MetricTuple {
    pub fn new(mae: [f64; 4], rmse: [f64; 4], bad4: f64, bad2: f64) -> Self {
        Self {
            mae,
            rmse,
            bad4,
            bad2,
        }
    }
    /// 全部有效像素的 MAE
    pub fn mae_all(&self) -> f64 {
        self.mae[0]
    }
    /// 全部有效像素的 RMSE
    pub fn rmse_all(&self) -> f64 {
        self.rmse[0]
    }
    /// 是否存在没有像素的类别
    pub fn has_empty_category(&self) -> bool {
        self.mae.iter().any(|v| v.is_nan()) || self.rmse.iter().any(|v| v.is_nan())
    }
}
