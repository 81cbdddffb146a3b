use std::fmt;
use std::path::Path;

use image::{imageops, Rgb, RgbImage};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use ndarray::prelude::*;
use plotters::prelude::*;
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};

use crate::core::{Category, CATEGORY_PALETTE};
use crate::error::{self, Error, Result};
use crate::metrics::EpeHistogram;

/// 无效像素显示颜色
const INVALID_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

pub fn init_log(level: &str) -> Result<()> {
    let stdout: ConsoleAppender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{h({l})}] - {m}{n}",
        )))
        .build();
    let log_config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(
            Root::builder()
                .appender("stdout")
                .build(if level == "trace" {
                    LevelFilter::Trace
                } else if level == "debug" {
                    LevelFilter::Debug
                } else {
                    LevelFilter::Info
                }),
        )
        .map_err(|e| Error::with_context(3006, error::ERROR_3006, &e.to_string()))?;
    log4rs::init_config(log_config)
        .map_err(|e| Error::with_context(3006, error::ERROR_3006, &e.to_string()))?;
    Ok(())
}

fn draw_error<E: fmt::Display>(e: E) -> Error {
    Error::with_context(3007, error::ERROR_3007, &e.to_string())
}

/// viridis 色表, t 截断到 [0, 1], NaN 按 0 处理
fn viridis(t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0f64 } else { t.max(0f64).min(1f64) };
    let RGBColor(r, g, b) = ViridisRGB.get_color(t);
    Rgb([r, g, b])
}

fn to_color_image<F>(source: &ArrayView2<f64>, color: F) -> RgbImage
where
    F: Fn(f64) -> Rgb<u8>,
{
    let (height, width) = source.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        color(source[[y as usize, x as usize]])
    })
}

/// 类别图转换为彩色图
pub fn to_category_image(categories: &ArrayView2<u8>) -> RgbImage {
    let (height, width) = categories.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let label = categories[[y as usize, x as usize]];
        match Category::from_label(label) {
            Some(c) => c.color(),
            None => CATEGORY_PALETTE[0],
        }
    })
}

/// 视差图转换为彩色图, 按给定范围归一化, 值为 0 的像素显示为灰色
pub fn to_disparity_image(source: &ArrayView2<f64>, min: f64, max: f64) -> RgbImage {
    let d = max - min;
    to_color_image(source, |v| {
        if v == 0f64 || v.is_nan() {
            INVALID_COLOR
        } else if d > 0f64 {
            viridis((v.abs() - min) / d)
        } else {
            viridis(0f64)
        }
    })
}

/// 误差图转换为彩色图, 误差范围 [0, epe_thresh], 真值无效处为灰色
pub fn to_error_image(
    error: &ArrayView2<f64>,
    gt: &ArrayView2<f64>,
    epe_thresh: f64,
) -> RgbImage {
    let (height, width) = error.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (y, x) = (y as usize, x as usize);
        if gt[[y, x]] == 0f64 {
            INVALID_COLOR
        } else {
            viridis(error[[y, x]].abs() / epe_thresh)
        }
    })
}

/// 非零有效值的最小值/最大值
fn value_range(maps: &[ArrayView2<f64>]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for map in maps.iter() {
        for v in map.iter() {
            let v = v.abs();
            if v == 0f64 || !v.is_finite() {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min > max {
        (0f64, 0f64)
    } else {
        (min, max)
    }
}

/// ## 单个条目总览图
/// 2 x 3 排列:
///
/// ```text
/// wta         gt          output
/// rgb         categories  error
/// ```
pub fn overview_image(
    wta: &ArrayView2<f64>,
    gt: &ArrayView2<f64>,
    output: &ArrayView2<f64>,
    rgb: &RgbImage,
    categories: &ArrayView2<u8>,
    error: &ArrayView2<f64>,
    epe_thresh: f64,
) -> Result<RgbImage> {
    let (height, width) = gt.dim();
    let (width, height) = (width as u32, height as u32);
    let (min, max) = value_range(&[wta.view(), gt.view(), output.view()]);
    let panels = [
        to_disparity_image(wta, min, max),
        to_disparity_image(gt, min, max),
        to_disparity_image(output, min, max),
        imageops::resize(rgb, width, height, imageops::FilterType::Triangle),
        to_category_image(categories),
        to_error_image(error, gt, epe_thresh),
    ];
    let size = (width * 3, height * 2);
    let mut buffer = vec![0u8; (size.0 * size.1 * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        // 按行切分, 顺序与 panels 一致
        for (area, panel) in root.split_evenly((2, 3)).iter().zip(panels.iter()) {
            for (x, y, p) in panel.enumerate_pixels() {
                area.draw_pixel((x as i32, y as i32), &RGBColor(p[0], p[1], p[2]))
                    .map_err(draw_error)?;
            }
        }
        root.present().map_err(draw_error)?;
    }
    RgbImage::from_raw(size.0, size.1, buffer).ok_or_else(|| Error::new(3007, error::ERROR_3007))
}

/// ## 误差直方图图像
/// 横轴为 [0, epe_thresh) 上的分箱序号, 颜色取该类别的调色板颜色.
pub fn save_epe_histogram<P: AsRef<Path>>(path: P, hist: &EpeHistogram) -> Result<()> {
    let bins = hist.counts.len() as u32;
    let top = hist.counts.iter().copied().max().unwrap_or(0).max(1);
    let Rgb([r, g, b]) = hist.category.color();

    let root = BitMapBackend::new(path.as_ref(), (640, 480)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            format!("{} EPE-{}", hist.category.name(), hist.epe_thresh),
            ("sans-serif", 20.0),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d((0u32..bins).into_segmented(), 0u32..top + top / 10 + 1)
        .map_err(draw_error)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .draw()
        .map_err(draw_error)?;
    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(RGBColor(r, g, b).filled())
                .margin(1)
                .data(hist.counts.iter().enumerate().map(|(i, c)| (i as u32, *c))),
        )
        .map_err(draw_error)?;
    root.present().map_err(draw_error)?;
    Ok(())
}
