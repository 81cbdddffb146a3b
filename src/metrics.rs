use image::Rgb;
use ndarray::{prelude::*, Zip};
use ndhistogram::{axis::Uniform, ndhistogram, Histogram};

use crate::core::{Category, MetricTuple, CATEGORY_PALETTE};
use crate::error::{self, Error, Result};

/// 检查视差图的均值必须大于 0
///
/// 均值不大于 0(或为 NaN)说明数据未正确加载, 或单位/符号约定不对.
pub fn check_positive_mean(map: &ArrayView2<f64>, name: &str) -> Result<()> {
    match map.mean() {
        Some(mean) if mean > 0f64 => Ok(()),
        _ => Err(Error::with_context(1001, error::ERROR_1001, name)),
    }
}

/// 检查视差图中至少有一个无效(0)像素
pub fn check_has_invalid(map: &ArrayView2<f64>, name: &str) -> Result<()> {
    if map.iter().any(|v| *v == 0f64) {
        Ok(())
    } else {
        Err(Error::with_context(1002, error::ERROR_1002, name))
    }
}

/// 检查两幅图尺寸一致
pub fn check_same_dim<A, B>(a: &ArrayView2<A>, b: &ArrayView2<B>, name: &str) -> Result<()> {
    if a.dim() == b.dim() {
        Ok(())
    } else {
        Err(Error::with_context(
            1003,
            error::ERROR_1003,
            &format!("{} {:?} vs {:?}", name, a.dim(), b.dim()),
        ))
    }
}

/// ## 构建像素类别图
/// 以真值为基准, 根据初始(WTA)视差与真值是否一致, 将每个像素划分为
///  * 0: 真值无效
///  * 1: 初始视差与真值误差小于 4
///  * 2: 初始视差与真值误差不小于 4
///  * 3: 真值有效, 初始视差缺失
///
/// wta 与 gt 的值 0 表示缺失, 两者均值必须大于 0.
///### 返回
/// (类别图, 类别调色板)
pub fn create_category_mask(
    wta: &ArrayView2<f64>,
    gt: &ArrayView2<f64>,
) -> Result<(Array2<u8>, [Rgb<u8>; 4])> {
    check_positive_mean(wta, "wta")?;
    check_positive_mean(gt, "gt")?;
    check_same_dim(wta, gt, "wta/gt")?;
    let mut ret = Array2::<u8>::zeros(gt.dim());
    Zip::from(&mut ret)
        .and(wta)
        .and(gt)
        .par_for_each(|label, &w, &g| {
            *label = Category::classify(w, g).label();
        });
    Ok((ret, CATEGORY_PALETTE))
}

/// 误差图: 真值有效处为 |output - gt|, 其余为 0
pub fn compute_error_map(output: &ArrayView2<f64>, gt: &ArrayView2<f64>) -> Result<Array2<f64>> {
    check_same_dim(output, gt, "output/gt")?;
    let mut ret = Array2::<f64>::zeros(gt.dim());
    Zip::from(&mut ret)
        .and(output)
        .and(gt)
        .par_for_each(|e, &o, &g| {
            if g != 0f64 {
                *e = (o - g).abs();
            }
        });
    Ok(ret)
}

/// 掩膜内的平均绝对误差, 掩膜为空时为 NaN
pub fn calc_mae(error: &ArrayView2<f64>, mask: &ArrayView2<bool>) -> f64 {
    let (sum, count) = masked_fold(error, mask, |e| e.abs());
    sum / count as f64
}

/// 掩膜内的均方根误差, 掩膜为空时为 NaN
pub fn calc_rmse(error: &ArrayView2<f64>, mask: &ArrayView2<bool>) -> f64 {
    let (sum, count) = masked_fold(error, mask, |e| e * e);
    (sum / count as f64).sqrt()
}

/// 坏点率: 误差大于 `threshold * valid` 的像素数 / 有效像素数
///
/// 阈值按像素乘以有效掩膜, 因此无效像素只要误差非 0 也会被计入;
/// 误差图在无效处恒为 0, 实际不会发生.
pub fn calc_bad_rate(error: &ArrayView2<f64>, valid: &ArrayView2<bool>, threshold: f64) -> f64 {
    let mut bad = 0usize;
    let mut count = 0usize;
    Zip::from(error).and(valid).for_each(|&e, &v| {
        let limit = if v { threshold } else { 0f64 };
        if e > limit {
            bad += 1;
        }
        if v {
            count += 1;
        }
    });
    bad as f64 / count as f64
}

fn masked_fold<F>(error: &ArrayView2<f64>, mask: &ArrayView2<bool>, f: F) -> (f64, usize)
where
    F: Fn(f64) -> f64,
{
    let mut sum = 0f64;
    let mut count = 0usize;
    Zip::from(error).and(mask).for_each(|&e, &m| {
        if m {
            sum += f(e);
            count += 1;
        }
    });
    (sum, count)
}

/// ## 计算评估指标
/// 分别在全部有效像素、类别 1、类别 2、类别 3 上计算 MAE 与 RMSE,
/// 并在全部有效像素上计算 Bad4 / Bad2.
pub fn calc_metrics(error: &ArrayView2<f64>, categories: &ArrayView2<u8>) -> Result<MetricTuple> {
    check_same_dim(error, categories, "error/categories")?;
    let valid = categories.mapv(|c| c > Category::Invalid.label());
    let masks = [
        categories.mapv(|c| c == Category::Correct.label()),
        categories.mapv(|c| c == Category::Incorrect.label()),
        categories.mapv(|c| c == Category::Hole.label()),
    ];
    let mut mae = [calc_mae(error, &valid.view()), 0f64, 0f64, 0f64];
    let mut rmse = [calc_rmse(error, &valid.view()), 0f64, 0f64, 0f64];
    for (i, mask) in masks.iter().enumerate() {
        mae[i + 1] = calc_mae(error, &mask.view());
        rmse[i + 1] = calc_rmse(error, &mask.view());
    }
    let bad4 = calc_bad_rate(error, &valid.view(), 4f64);
    let bad2 = calc_bad_rate(error, &valid.view(), 2f64);
    Ok(MetricTuple::new(mae, rmse, bad4, bad2))
}

/// 某类别像素的误差直方图
#[derive(Clone, Debug, PartialEq)]
pub struct EpeHistogram {
    pub category: Category,
    pub epe_thresh: f64,
    /// [0, epe_thresh) 等宽分箱的计数
    pub counts: Vec<u32>,
    /// 误差不小于 epe_thresh 的像素数
    pub overflow: u32,
}

impl EpeHistogram {
    pub fn total(&self) -> u32 {
        self.counts.iter().sum::<u32>() + self.overflow
    }
}

/// ## 误差直方图
/// 统计某一类别内像素误差在 [0, epe_thresh) 上的分布, 用于替代误差图的可视化.
pub fn epe_histogram(
    error: &ArrayView2<f64>,
    categories: &ArrayView2<u8>,
    category: Category,
    epe_thresh: f64,
    bins: usize,
) -> EpeHistogram {
    let mut hist = ndhistogram!(Uniform::new(bins, 0f64, epe_thresh); u32);
    Zip::from(error).and(categories).for_each(|e, c| {
        if *c == category.label() && !e.is_nan() {
            hist.fill(e);
        }
    });
    // values 依次为: 下溢, bins 个分箱, 上溢
    let values: Vec<u32> = hist.values().copied().collect();
    EpeHistogram {
        category,
        epe_thresh,
        counts: values[1..values.len() - 1].to_vec(),
        overflow: values[values.len() - 1],
    }
}
