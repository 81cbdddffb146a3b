use getset::Getters;
use image::RgbImage;
use ndarray::prelude::*;

use crate::core::MetricTuple;
use crate::error::{self, Error, Result};

/// 单个条目加载后的数据
#[derive(Getters, Clone, Debug)]
pub struct ItemData {
    /// 初始(WTA)视差
    #[getset(get = "pub")]
    wta: Array2<f64>,
    /// 真值视差
    #[getset(get = "pub")]
    gt: Array2<f64>,
    /// 待评估视差
    #[getset(get = "pub")]
    output: Array2<f64>,
    /// 彩色原图, 仅用于可视化
    #[getset(get = "pub")]
    rgb: RgbImage,
}

impl ItemData {
    pub fn new(wta: Array2<f64>, gt: Array2<f64>, output: Array2<f64>, rgb: RgbImage) -> Self {
        Self {
            wta,
            gt,
            output,
            rgb,
        }
    }
}

/// 单个条目的评估结果
#[derive(Getters, Clone, Debug)]
pub struct ItemResults {
    #[getset(get = "pub")]
    metrics: MetricTuple,
    /// 类别图
    #[getset(get = "pub")]
    categories: Array2<u8>,
    /// 误差图, 真值无效处为 0
    #[getset(get = "pub")]
    error_map: Array2<f64>,
    /// 单行结果描述
    #[getset(get = "pub")]
    details: String,
}

impl ItemResults {
    pub fn new(
        metrics: MetricTuple,
        categories: Array2<u8>,
        error_map: Array2<f64>,
        details: String,
    ) -> Self {
        Self {
            metrics,
            categories,
            error_map,
            details,
        }
    }
}

/// 每个数据集条目(Adiron, ArtL, ...)的评估容器
///
/// 先 `set_data` 再 `set_results`, 两步都完成后才可读取结果.
/// 完成后的条目不可再修改.
#[derive(Getters, Clone, Debug)]
pub struct EvaluationItem {
    #[getset(get = "pub")]
    name: String,
    data: Option<ItemData>,
    results: Option<ItemResults>,
}

impl EvaluationItem {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: None,
            results: None,
        }
    }

    /// 只能设置一次
    pub fn set_data(&mut self, data: ItemData) -> Result<()> {
        if self.data.is_some() {
            return Err(Error::with_context(1007, error::ERROR_1007, &self.name));
        }
        self.data = Some(data);
        Ok(())
    }

    /// 只能设置一次, 且须在 `set_data` 之后
    pub fn set_results(&mut self, results: ItemResults) -> Result<()> {
        if self.data.is_none() {
            return Err(Error::with_context(1006, error::ERROR_1006, &self.name));
        }
        if self.results.is_some() {
            return Err(Error::with_context(1007, error::ERROR_1007, &self.name));
        }
        self.results = Some(results);
        Ok(())
    }

    pub fn data(&self) -> Result<&ItemData> {
        self.data
            .as_ref()
            .ok_or_else(|| Error::with_context(1006, error::ERROR_1006, &self.name))
    }

    pub fn results(&self) -> Result<&ItemResults> {
        match (&self.data, &self.results) {
            (Some(_), Some(r)) => Ok(r),
            _ => Err(Error::with_context(1005, error::ERROR_1005, &self.name)),
        }
    }

    pub fn metrics(&self) -> Result<&MetricTuple> {
        Ok(self.results()?.metrics())
    }

    pub fn details(&self) -> Result<&str> {
        Ok(self.results()?.details().as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.data.is_some() && self.results.is_some()
    }
}

/// 单行结果描述: `<name>: MAE=.., RMSE=.., BAD4=..%, BAD2=..%`
pub fn format_details(name: &str, metrics: &MetricTuple) -> String {
    format!(
        "{}: MAE={:6.3}, RMSE={:6.3}, BAD4={:5.2}%, BAD2={:5.2}%",
        name,
        metrics.mae_all(),
        metrics.rmse_all(),
        100f64 * metrics.bad4(),
        100f64 * metrics.bad2()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> ItemData {
        let map = Array2::<f64>::from_elem((2, 2), 5.0);
        ItemData::new(map.clone(), map.clone(), map, RgbImage::new(2, 2))
    }

    fn sample_results() -> ItemResults {
        let metrics = MetricTuple::new([1.0, 0.5, 2.0, 3.0], [1.5, 0.5, 2.5, 3.5], 0.125, 0.25);
        ItemResults::new(
            metrics,
            Array2::<u8>::zeros((2, 2)),
            Array2::<f64>::zeros((2, 2)),
            format_details("ArtL", &metrics),
        )
    }

    #[test]
    fn test_two_phase_construction() {
        let mut item = EvaluationItem::new("ArtL");
        assert_eq!(item.results().unwrap_err().code, 1005);
        assert_eq!(item.set_results(sample_results()).unwrap_err().code, 1006);
        item.set_data(sample_data()).unwrap();
        assert!(!item.is_complete());
        assert_eq!(item.metrics().unwrap_err().code, 1005);
        item.set_results(sample_results()).unwrap();
        assert!(item.is_complete());
        assert_eq!(item.metrics().unwrap().mae_all(), 1.0);
    }

    #[test]
    fn test_frozen_after_set() {
        let mut item = EvaluationItem::new("ArtL");
        item.set_data(sample_data()).unwrap();
        // 数据不可替换
        let other = ItemData::new(
            Array2::<f64>::zeros((2, 2)),
            Array2::<f64>::zeros((2, 2)),
            Array2::<f64>::zeros((2, 2)),
            RgbImage::new(2, 2),
        );
        assert_eq!(item.set_data(other.clone()).unwrap_err().code, 1007);
        assert_eq!(item.data().unwrap().wta()[[0, 0]], 5.0);

        item.set_results(sample_results()).unwrap();
        let replaced = ItemResults::new(
            MetricTuple::new([9.0; 4], [9.0; 4], 1.0, 1.0),
            Array2::<u8>::zeros((2, 2)),
            Array2::<f64>::zeros((2, 2)),
            "changed".to_string(),
        );
        assert_eq!(item.set_results(replaced).unwrap_err().code, 1007);
        assert_eq!(item.set_data(other).unwrap_err().code, 1007);
        assert!(item.is_complete());
        assert_eq!(item.metrics().unwrap().mae_all(), 1.0);
        assert!(item.details().unwrap().starts_with("ArtL: MAE= 1.000"));
    }

    #[test]
    fn test_format_details() {
        let metrics = MetricTuple::new([1.0, 0.5, 2.0, 3.0], [1.5, 0.5, 2.5, 3.5], 0.125, 0.25);
        assert_eq!(
            format_details("ArtL       ", &metrics),
            "ArtL       : MAE= 1.000, RMSE= 1.500, BAD4=12.50%, BAD2=25.00%"
        );
    }
}
