use std::path::PathBuf;

use getset::{CopyGetters, Getters, MutGetters, Setters};

use crate::error::{self, Error, Result};

/// 绘图/诊断输出级别
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlotMode {
    /// 0: 不输出
    Disabled,
    /// 1: 输出各类别误差直方图到日志
    Enabled,
    /// 2: 在 1 的基础上保存总览图到磁盘
    Save,
}

impl PlotMode {
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(PlotMode::Disabled),
            1 => Ok(PlotMode::Enabled),
            2 => Ok(PlotMode::Save),
            _ => Err(Error::with_context(
                3005,
                error::ERROR_3005,
                &level.to_string(),
            )),
        }
    }
}

/// 某个类别在单张图中没有像素时的处理方式
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmptyCategoryPolicy {
    /// 结果记为 NaN, 汇总时跳过
    Skip,
    /// 直接报错
    Fail,
}

/// 评估参数设置
#[derive(Getters, Setters, MutGetters, CopyGetters, Clone, Debug)]
pub struct EvalOption {
    /// 绘图/诊断级别
    #[getset(get = "pub", set = "pub")]
    plot: PlotMode,
    /// 误差图显示上限(像素)
    #[getset(get = "pub", set = "pub")]
    epe_thresh: f64,
    /// 空类别处理方式
    #[getset(get = "pub", set = "pub")]
    empty_category: EmptyCategoryPolicy,
    /// 结果输出目录
    #[getset(get = "pub", set = "pub")]
    output_dir: PathBuf,
    /// 数据集根目录, None 时使用数据集默认路径
    #[getset(get = "pub", set = "pub")]
    data_root: Option<PathBuf>,
}

impl Default for EvalOption {
    fn default() -> Self {
        Self {
            plot: PlotMode::Disabled,
            epe_thresh: 20.0,
            empty_category: EmptyCategoryPolicy::Skip,
            output_dir: PathBuf::from("eval_results"),
            data_root: None,
        }
    }
}

impl EvalOption {
    pub fn new(plot: PlotMode, epe_thresh: f64) -> Self {
        let mut r = EvalOption::default();
        r.plot = plot;
        r.epe_thresh = epe_thresh;
        r
    }
    /// 检查参数合法性
    pub fn validate(&self) -> Result<()> {
        if !(self.epe_thresh > 0.0) {
            return Err(Error::with_context(
                3004,
                error::ERROR_3004,
                &self.epe_thresh.to_string(),
            ));
        }
        Ok(())
    }
    ///
    pub fn build(&self) -> Self {
        self.clone()
    }
}
