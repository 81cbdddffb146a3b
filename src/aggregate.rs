use chrono::Local;
use log::debug;
use ndarray::prelude::*;

use crate::core::{DatasetSummary, EvaluationItem};
use crate::error::Result;

/// 忽略 NaN 的均值, 全部为 NaN(或为空)时返回 NaN
///
/// 求和前先排序, 结果与输入顺序无关.
pub fn nan_mean(values: &ArrayView1<f64>) -> (f64, usize) {
    let mut finite: Vec<f64> = values.iter().cloned().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return (f64::NAN, 0);
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    let count = finite.len();
    (finite.iter().sum::<f64>() / count as f64, count)
}

/// 按列求 nan_mean
fn column_means(matrix: &Array2<f64>) -> ([f64; 4], [usize; 4]) {
    let mut means = [f64::NAN; 4];
    let mut counts = [0usize; 4];
    for (c, column) in matrix.columns().into_iter().enumerate().take(4) {
        let (mean, count) = nan_mean(&column);
        means[c] = mean;
        counts[c] = count;
    }
    (means, counts)
}

/// ## 数据集汇总
/// 将每个条目的 MAE / RMSE 叠成 N x 4 矩阵, 按列(类别)求均值;
/// Bad4 / Bad2 乘 100 后求均值.
///
/// 没有像素的类别(NaN)在对应列中被跳过.
pub fn summarize(items: &[EvaluationItem], title: &str) -> Result<DatasetSummary> {
    let n = items.len();
    let mut mae = Array2::<f64>::zeros((n, 4));
    let mut rmse = Array2::<f64>::zeros((n, 4));
    let mut bad4 = Array1::<f64>::zeros(n);
    let mut bad2 = Array1::<f64>::zeros(n);
    for (i, item) in items.iter().enumerate() {
        let metrics = item.metrics()?;
        mae.row_mut(i).assign(&aview1(metrics.mae()));
        rmse.row_mut(i).assign(&aview1(metrics.rmse()));
        bad4[i] = 100f64 * metrics.bad4();
        bad2[i] = 100f64 * metrics.bad2();
    }
    let (mae_means, counts) = column_means(&mae);
    let (rmse_means, _) = column_means(&rmse);
    let (bad4_mean, _) = nan_mean(&bad4.view());
    let (bad2_mean, _) = nan_mean(&bad2.view());
    debug!(
        "[summarize] {} items, per category item counts: {:?}",
        n, counts
    );
    let timestamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
    Ok(DatasetSummary::new(
        title, &timestamp, n, mae_means, rmse_means, counts, bad4_mean, bad2_mean,
    ))
}

/// 结果文件内容: 每个条目的结果行, 之后是汇总
pub fn report(items: &[EvaluationItem], summary: &DatasetSummary) -> Result<String> {
    let mut ret = String::new();
    for item in items.iter() {
        ret.push_str(item.details()?);
        ret.push('\n');
    }
    ret.push_str(&summary.to_string());
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{format_details, ItemData, ItemResults, MetricTuple};
    use image::RgbImage;
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    fn item(name: &str, metrics: MetricTuple) -> EvaluationItem {
        let map = Array2::<f64>::from_elem((1, 1), 1.0);
        let mut ret = EvaluationItem::new(name);
        ret.set_data(ItemData::new(
            map.clone(),
            map.clone(),
            map.clone(),
            RgbImage::new(1, 1),
        ))
        .unwrap();
        ret.set_results(ItemResults::new(
            metrics,
            Array2::<u8>::zeros((1, 1)),
            map,
            format_details(name, &metrics),
        ))
        .unwrap();
        ret
    }

    #[test]
    fn test_nan_mean() {
        let (mean, count) = nan_mean(&array![1., f64::NAN, 3.].view());
        assert_eq!(mean, 2.);
        assert_eq!(count, 2);
        let (mean, count) = nan_mean(&array![f64::NAN].view());
        assert!(mean.is_nan());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_summarize_skips_empty_categories() {
        let items = vec![
            item("a", MetricTuple::new([1., 1., f64::NAN, 2.], [2., 2., f64::NAN, 3.], 0.1, 0.2)),
            item("b", MetricTuple::new([3., 1., 5., f64::NAN], [4., 2., 6., f64::NAN], 0.3, 0.4)),
        ];
        let summary = summarize(&items, "MiddV3 Dataset - SDR").unwrap();
        assert_eq!(summary.item_count(), 2);
        assert_eq!(*summary.mae(), [2., 1., 5., 2.]);
        assert_eq!(*summary.rmse(), [3., 2., 6., 3.]);
        assert_eq!(*summary.category_counts(), [2, 2, 1, 1]);
        assert!((summary.bad4() - 20.).abs() < 1e-12);
        assert!((summary.bad2() - 30.).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_incomplete_item() {
        let items = vec![EvaluationItem::new("pending")];
        assert_eq!(summarize(&items, "t").unwrap_err().code, 1005);
    }

    #[test]
    fn test_order_independent() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut items: Vec<EvaluationItem> = (0..25)
            .map(|i| {
                let mut mae = [0f64; 4];
                let mut rmse = [0f64; 4];
                for c in 0..4 {
                    mae[c] = if rng.gen::<f64>() < 0.1 { f64::NAN } else { rng.gen_range(0.0..10.0) };
                    rmse[c] = mae[c] * 1.3;
                }
                let metrics = MetricTuple::new(mae, rmse, rng.gen(), rng.gen());
                item(&format!("item{}", i), metrics)
            })
            .collect();
        let expected = summarize(&items, "t").unwrap();
        for _ in 0..5 {
            items.shuffle(&mut rng);
            let summary = summarize(&items, "t").unwrap();
            for c in 0..4 {
                assert_eq!(summary.mae()[c].to_bits(), expected.mae()[c].to_bits());
                assert_eq!(summary.rmse()[c].to_bits(), expected.rmse()[c].to_bits());
            }
            assert_eq!(summary.bad4().to_bits(), expected.bad4().to_bits());
            assert_eq!(summary.bad2().to_bits(), expected.bad2().to_bits());
        }
    }

    #[test]
    fn test_report() {
        let metrics = MetricTuple::new([1., 1., 1., 1.], [1., 1., 1., 1.], 0., 0.);
        let items = vec![item("a", metrics), item("b", metrics)];
        let summary = summarize(&items, "LIU Dataset - SAAB").unwrap();
        let text = report(&items, &summary).unwrap();
        assert!(text.starts_with("a: MAE= 1.000, RMSE= 1.000, BAD4= 0.00%, BAD2= 0.00%\nb: "));
        assert!(text.contains("LIU Dataset - SAAB\n"));
    }
}
