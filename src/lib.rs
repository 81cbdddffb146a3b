//! 双目视差结果评估
//!
//! 以真值为基准, 结合初始(WTA)视差对像素分类, 计算各类别的 MAE / RMSE 与坏点率,
//! 并汇总整个数据集的结果.
extern crate image;

pub mod aggregate;
pub mod core;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod pfm;
pub mod utils;
mod evaluator;

pub use evaluator::*;
