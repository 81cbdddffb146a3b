use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::RgbImage;
use log::trace;
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use nshare::ToNdarray2;

use crate::core::ItemData;
use crate::error::{self, Error, Result};
use crate::metrics::{check_has_invalid, check_positive_mean, check_same_dim};
use crate::pfm::{read_pfm, write_pfm};

/// 数据集
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    Liu,
    MiddV3,
}

/// 待评估的视差来源
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Nconv,
    Sdr,
    Inpaint,
    Saab,
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "liu" => Ok(DatasetKind::Liu),
            "middv3" => Ok(DatasetKind::MiddV3),
            _ => Err(Error::with_context(3001, error::ERROR_3001, s)),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nconv" => Ok(Mode::Nconv),
            "sdr" => Ok(Mode::Sdr),
            "inpaint" => Ok(Mode::Inpaint),
            "saab" => Ok(Mode::Saab),
            _ => Err(Error::with_context(3002, error::ERROR_3002, s)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Mode::Nconv => "nconv",
            Mode::Sdr => "sdr",
            Mode::Inpaint => "inpaint",
            Mode::Saab => "saab",
        };
        write!(f, "{}", s)
    }
}

impl DatasetKind {
    /// 命令行标识
    pub fn tag(&self) -> &'static str {
        match self {
            DatasetKind::Liu => "liu",
            DatasetKind::MiddV3 => "middv3",
        }
    }
    /// 显示名称, 同时也是结果目录名
    pub fn display_name(&self) -> &'static str {
        match self {
            DatasetKind::Liu => "LIU",
            DatasetKind::MiddV3 => "MiddV3",
        }
    }
    pub fn default_root(&self) -> PathBuf {
        match self {
            DatasetKind::Liu => PathBuf::from("data/liu_dataset/"),
            DatasetKind::MiddV3 => PathBuf::from("data/MiddV3/trainingH/"),
        }
    }
    /// 检查该数据集是否提供此模式的结果
    pub fn supports(&self, mode: Mode) -> Result<()> {
        if mode == Mode::Nconv && *self != DatasetKind::Liu {
            return Err(Error::new(3003, error::ERROR_3003));
        }
        Ok(())
    }
    /// 创建数据加载器, root 为 None 时使用默认目录
    pub fn loader(&self, mode: Mode, root: Option<&Path>) -> Result<Box<dyn DatasetLoader>> {
        self.supports(mode)?;
        let root = root.map(Path::to_path_buf).unwrap_or_else(|| self.default_root());
        let loader: Box<dyn DatasetLoader> = match self {
            DatasetKind::Liu => Box::new(LiuDataset::new(root, mode)),
            DatasetKind::MiddV3 => Box::new(MiddV3Dataset::new(root, mode)),
        };
        Ok(loader)
    }
}

/// 数据集中的一个条目
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetItem {
    /// LIU: 相机对, 场景编号, 是否使用合并真值
    Liu {
        pair: String,
        scene: String,
        merged: bool,
    },
    /// MiddV3: 场景目录名 (Adiron, ArtL, ...)
    MiddV3 { folder: String },
}

/// 数据集加载策略
pub trait DatasetLoader {
    fn kind(&self) -> DatasetKind;
    fn mode(&self) -> Mode;
    /// 枚举所有待评估条目
    fn items(&self) -> Result<Vec<DatasetItem>>;
    /// 加载条目数据, 返回前已完成合法性检查
    fn load(&self, item: &DatasetItem) -> Result<ItemData>;
    /// 条目显示名称
    fn item_name(&self, item: &DatasetItem) -> Result<String>;
    /// 条目总览图保存路径(相对输出目录)
    fn figure_path(&self, item: &DatasetItem) -> Result<PathBuf>;
}

impl DatasetItem {
    /// LIU 条目的 (相机对, 场景, 是否合并真值)
    fn liu(&self) -> Result<(&str, &str, bool)> {
        match self {
            DatasetItem::Liu {
                pair,
                scene,
                merged,
            } => Ok((pair.as_str(), scene.as_str(), *merged)),
            DatasetItem::MiddV3 { folder } => {
                Err(Error::with_context(3008, error::ERROR_3008, folder))
            }
        }
    }
    /// MiddV3 条目的场景目录名
    fn middv3(&self) -> Result<&str> {
        match self {
            DatasetItem::MiddV3 { folder } => Ok(folder.as_str()),
            DatasetItem::Liu { pair, scene, .. } => Err(Error::with_context(
                3008,
                error::ERROR_3008,
                &format!("{}/{}", pair, scene),
            )),
        }
    }
}

/// 结果文件路径(相对输出目录)
pub fn results_path(kind: DatasetKind, mode: Mode) -> PathBuf {
    Path::new(kind.display_name()).join(format!("eval_results_{}_{}.txt", kind.tag(), mode))
}

/// 16 位 PNG 视差编码转换
pub fn scale_disp(d: &ArrayView2<f64>) -> Array2<f64> {
    d.mapv(|v| -v / 64f64 + 350f64)
}

/// 读取 16 位灰度 PNG
pub fn read_png_gray<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let path = path.as_ref();
    trace!("    [read_png_gray] {}", path.display());
    let image = image::open(path)?.to_luma16();
    Ok(image.into_ndarray2().mapv(|v| v as f64))
}

/// 读取彩色 PNG
pub fn read_png_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(image::open(path.as_ref())?.to_rgb8())
}

fn read_pfm_disparity(path: &Path) -> Result<Array2<f64>> {
    trace!("    [read_pfm_disparity] {}", path.display());
    read_pfm(path)?.to_disparity()
}

/// 将 PNG 视差转换为 PFM, 最大值为 0 时翻转为正视差
pub fn make_pfm<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<Array2<f32>> {
    let mut d = scale_disp(&read_png_gray(src)?.view());
    if *d.max_skipnan() == 0f64 {
        d.mapv_inplace(|v| -v);
    }
    let d = d.mapv(|v| v as f32);
    write_pfm(dst, &d.view(), 1f32)?;
    Ok(d)
}

/// MiddV3 真值中 +inf 表示未知视差, 置为 0(无效); 其余值(包括 -inf)保持不变
pub fn clear_unknown_gt(gt: Array2<f64>) -> Array2<f64> {
    gt.mapv(|v| if v == f64::INFINITY { 0f64 } else { v })
}

/// 检查一组视差图: 尺寸一致, 均值大于 0, wta 与 gt 含无效像素
pub fn check_item_data(
    wta: &ArrayView2<f64>,
    output: &ArrayView2<f64>,
    gt: &ArrayView2<f64>,
) -> Result<()> {
    check_same_dim(wta, gt, "wta/gt")?;
    check_same_dim(output, gt, "output/gt")?;
    check_positive_mean(wta, "wta")?;
    check_positive_mean(gt, "gt")?;
    check_positive_mean(output, "output")?;
    check_has_invalid(wta, "wta")?;
    check_has_invalid(gt, "gt")?;
    Ok(())
}

/// LIU 数据集
pub struct LiuDataset {
    root: PathBuf,
    mode: Mode,
}

impl LiuDataset {
    pub const PAIRS: [&'static str; 3] = ["left_pair", "middle_pair", "right_pair"];
    pub const MERGED_PAIR: &'static str = "middle_pair";

    pub fn new(root: PathBuf, mode: Mode) -> Self {
        Self { root, mode }
    }

    fn scenes() -> Vec<String> {
        (21..26).map(|i| format!("{:03}", i)).collect()
    }

    fn file(&self, pair: &str, folder: &str, scene: &str, ext: &str) -> PathBuf {
        self.root
            .join(pair)
            .join(folder)
            .join(format!("{}.{}", scene, ext))
    }
}

impl DatasetLoader for LiuDataset {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Liu
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn items(&self) -> Result<Vec<DatasetItem>> {
        let scenes = LiuDataset::scenes();
        let mut ret = Vec::new();
        for pair in LiuDataset::PAIRS.iter() {
            for scene in scenes.iter() {
                ret.push(DatasetItem::Liu {
                    pair: pair.to_string(),
                    scene: scene.clone(),
                    merged: false,
                });
            }
        }
        for scene in scenes.iter() {
            ret.push(DatasetItem::Liu {
                pair: LiuDataset::MERGED_PAIR.to_string(),
                scene: scene.clone(),
                merged: true,
            });
        }
        Ok(ret)
    }

    fn load(&self, item: &DatasetItem) -> Result<ItemData> {
        let (pair, scene, merged) = item.liu()?;
        let wta_path = self.file(pair, "left_initial_disparity", scene, "pfm");
        let wta = read_pfm_disparity(&wta_path)?;
        let output = match self.mode {
            Mode::Saab => wta.clone(),
            Mode::Sdr => read_pfm_disparity(&self.file(pair, "left_output_sdr", scene, "pfm"))?,
            Mode::Inpaint => scale_disp(
                &read_png_gray(self.file(pair, "left_output_inpaint", scene, "png"))?.view(),
            ),
            Mode::Nconv => scale_disp(
                &read_png_gray(self.file(pair, "left_output_nconv", scene, "png"))?.view(),
            ),
        };
        let gt_folder = if merged { "left_gt_merged" } else { "left_gt" };
        let gt = scale_disp(&read_png_gray(self.file(pair, gt_folder, scene, "png"))?.view())
            .mapv(f64::abs);
        let rgb = read_png_rgb(self.file(pair, "left_rgb", scene, "png"))?;
        check_item_data(&wta.view(), &output.view(), &gt.view())?;
        Ok(ItemData::new(wta, gt, output, rgb))
    }

    fn item_name(&self, item: &DatasetItem) -> Result<String> {
        let (pair, scene, merged) = item.liu()?;
        let pair = if merged {
            format!("{}(merge)", pair)
        } else {
            pair.to_string()
        };
        Ok(format!("{:<18} - {}", pair, scene))
    }

    fn figure_path(&self, item: &DatasetItem) -> Result<PathBuf> {
        let (pair, scene, merged) = item.liu()?;
        let mode = self.mode.to_string().to_uppercase();
        let suffix = if merged { "(merge)" } else { "" };
        Ok(Path::new("LIU")
            .join(pair)
            .join(format!("{}_{}{}.png", mode, scene, suffix)))
    }
}

/// Middlebury V3 数据集
pub struct MiddV3Dataset {
    root: PathBuf,
    mode: Mode,
}

impl MiddV3Dataset {
    pub fn new(root: PathBuf, mode: Mode) -> Self {
        Self { root, mode }
    }
}

impl DatasetLoader for MiddV3Dataset {
    fn kind(&self) -> DatasetKind {
        DatasetKind::MiddV3
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn items(&self) -> Result<Vec<DatasetItem>> {
        let mut folders = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        folders.sort();
        Ok(folders
            .into_iter()
            .map(|folder| DatasetItem::MiddV3 { folder })
            .collect())
    }

    fn load(&self, item: &DatasetItem) -> Result<ItemData> {
        let folder = self.root.join(item.middv3()?);
        let wta = read_pfm_disparity(&folder.join("disp_Initial_Saab.pfm"))?;
        let output = match self.mode {
            Mode::Saab => wta.clone(),
            Mode::Sdr => read_pfm_disparity(&folder.join("disp0FDR.pfm"))?,
            Mode::Inpaint => {
                scale_disp(&read_png_gray(folder.join("im0_inpaint_disp.png"))?.view())
                    .mapv(f64::abs)
            }
            Mode::Nconv => return Err(Error::new(3003, error::ERROR_3003)),
        };
        let gt = clear_unknown_gt(read_pfm_disparity(&folder.join("disp0GT.pfm"))?);
        let rgb = read_png_rgb(folder.join("im0.png"))?;
        check_item_data(&wta.view(), &output.view(), &gt.view())?;
        Ok(ItemData::new(wta, gt, output, rgb))
    }

    fn item_name(&self, item: &DatasetItem) -> Result<String> {
        Ok(format!("{:<11}", item.middv3()?))
    }

    fn figure_path(&self, item: &DatasetItem) -> Result<PathBuf> {
        let mode = self.mode.to_string().to_uppercase();
        Ok(Path::new("MiddV3").join(format!("{}_{}.png", mode, item.middv3()?)))
    }
}
