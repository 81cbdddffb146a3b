use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::prelude::*;

use crate::aggregate::{report, summarize};
use crate::core::{
    format_details, Category, DatasetSummary, EmptyCategoryPolicy, EvalOption, EvaluationItem,
    ItemResults, PlotMode,
};
use crate::dataset::{results_path, DatasetItem, DatasetKind, DatasetLoader, Mode};
use crate::error::{self, Error, Result};
use crate::metrics::{calc_metrics, compute_error_map, create_category_mask, epe_histogram};
use crate::utils::{overview_image, save_epe_histogram};

/// 误差直方图分箱数
const HISTOGRAM_BINS: usize = 10;

/// 误差直方图路径: 总览图文件名后加 `_epe_<类别>`
fn histogram_path(figure: &Path, category: Category) -> PathBuf {
    let stem = figure
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    figure.with_file_name(format!("{}_epe_{}.png", stem, category.label()))
}

/// ## 数据集评估器
/// 逐个条目加载数据, 计算类别图与误差指标, 最后汇总整个数据集并写入结果文件.
pub struct Evaluator {
    option: EvalOption,
    loader: Box<dyn DatasetLoader>,
    /// 已处理的条目, 只追加
    items: Vec<EvaluationItem>,
}

impl Evaluator {
    /// 创建评估器, 非法配置在处理任何条目前报错
    pub fn new(kind: DatasetKind, mode: Mode, option: Option<EvalOption>) -> Result<Self> {
        let option = option.unwrap_or_default();
        option.validate()?;
        let loader = kind.loader(mode, option.data_root().as_deref())?;
        Ok(Self::with_loader(loader, option))
    }
    /// 使用自定义加载器
    pub fn with_loader(loader: Box<dyn DatasetLoader>, option: EvalOption) -> Self {
        Self {
            option,
            loader,
            items: Vec::new(),
        }
    }

    pub fn option(&self) -> &EvalOption {
        &self.option
    }

    pub fn items(&self) -> &[EvaluationItem] {
        &self.items
    }

    /// 标题, 例如 `LIU Dataset - SDR`
    pub fn title(&self) -> String {
        format!(
            "{} Dataset - {}",
            self.loader.kind().display_name(),
            self.loader.mode().to_string().to_uppercase()
        )
    }

    /// ## 计算单个条目的结果
    /// 1. 类别图
    /// 2. 误差图(真值无效处为 0)
    /// 3. 评估指标
    pub fn process(
        &self,
        wta: &ArrayView2<f64>,
        gt: &ArrayView2<f64>,
        output: &ArrayView2<f64>,
        name: &str,
    ) -> Result<ItemResults> {
        let mut sw = stopwatch::Stopwatch::start_new();
        let (categories, _) = create_category_mask(wta, gt)?;
        let error_map = compute_error_map(output, gt)?;
        debug!(
            "    [process] category and error maps built. elapse time: {}ms",
            sw.elapsed_ms()
        );
        sw.restart();
        let metrics = calc_metrics(&error_map.view(), &categories.view())?;
        debug!(
            "    [process] metrics computed. elapse time: {}ms",
            sw.elapsed_ms()
        );
        if *self.option.empty_category() == EmptyCategoryPolicy::Fail
            && metrics.has_empty_category()
        {
            return Err(Error::with_context(1004, error::ERROR_1004, name));
        }
        let details = format_details(name, &metrics);
        Ok(ItemResults::new(metrics, categories, error_map, details))
    }

    /// 加载、计算并记录一个条目
    pub fn evaluate_item(&mut self, item: &DatasetItem) -> Result<&EvaluationItem> {
        let mut eval_item = EvaluationItem::new(&self.loader.item_name(item)?);
        let mut sw = stopwatch::Stopwatch::start_new();
        let data = self.loader.load(item)?;
        debug!(
            "[evaluate_item] {} loaded {:?}. elapse time: {}ms",
            eval_item.name().trim_end(),
            data.gt().dim(),
            sw.elapsed_ms()
        );
        sw.restart();
        let results = self.process(
            &data.wta().view(),
            &data.gt().view(),
            &data.output().view(),
            eval_item.name(),
        )?;
        debug!(
            "[evaluate_item] {} processed. elapse time: {}ms",
            eval_item.name().trim_end(),
            sw.elapsed_ms()
        );
        eval_item.set_data(data)?;
        eval_item.set_results(results)?;
        info!("Processed {}", eval_item.details()?);
        self.present(item, &eval_item)?;
        self.items.push(eval_item);
        self.items
            .last()
            .ok_or_else(|| Error::with_context(1005, error::ERROR_1005, &self.title()))
    }

    /// 按绘图级别输出诊断信息
    fn present(&self, item: &DatasetItem, eval_item: &EvaluationItem) -> Result<()> {
        if *self.option.plot() == PlotMode::Disabled {
            return Ok(());
        }
        let results = eval_item.results()?;
        let save = *self.option.plot() == PlotMode::Save;
        let path = self.option.output_dir().join(self.loader.figure_path(item)?);
        if save {
            if let Some(folder) = path.parent() {
                fs::create_dir_all(folder)?;
            }
        }
        for category in Category::ALL.iter().skip(1) {
            let hist = epe_histogram(
                &results.error_map().view(),
                &results.categories().view(),
                *category,
                *self.option.epe_thresh(),
                HISTOGRAM_BINS,
            );
            info!(
                "    {} EPE-{} histogram: {:?}, overflow: {}",
                category.name(),
                self.option.epe_thresh(),
                hist.counts,
                hist.overflow
            );
            if save {
                let hist_path = histogram_path(&path, *category);
                save_epe_histogram(&hist_path, &hist)?;
                debug!("[present] histogram saved to {}", hist_path.display());
            }
        }
        if save {
            let data = eval_item.data()?;
            let figure = overview_image(
                &data.wta().view(),
                &data.gt().view(),
                &data.output().view(),
                data.rgb(),
                &results.categories().view(),
                &results.error_map().view(),
                *self.option.epe_thresh(),
            )?;
            figure.save(&path)?;
            debug!("[present] figure saved to {}", path.display());
        }
        Ok(())
    }

    /// 数据集中所有条目处理完后计算汇总结果
    pub fn compile_results(&self) -> Result<DatasetSummary> {
        let summary = summarize(&self.items, &self.title())?;
        info!("\n{}", summary);
        Ok(summary)
    }

    /// 保存结果文件, 返回文件路径
    pub fn save_results(&self, summary: &DatasetSummary) -> Result<PathBuf> {
        let path = self
            .option
            .output_dir()
            .join(results_path(self.loader.kind(), self.loader.mode()));
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)?;
        }
        fs::write(&path, report(&self.items, summary)?)?;
        info!("Results saved to {}", path.display());
        Ok(path)
    }

    /// 评估整个数据集
    pub fn run(&mut self) -> Result<DatasetSummary> {
        let items = self.loader.items()?;
        info!("Evaluating {} with {} items", self.title(), items.len());
        let sw = stopwatch::Stopwatch::start_new();
        for item in items.iter() {
            self.evaluate_item(item)?;
        }
        debug!("[run] all items processed. elapse time: {}ms", sw.elapsed_ms());
        let summary = self.compile_results()?;
        self.save_results(&summary)?;
        Ok(summary)
    }
}
