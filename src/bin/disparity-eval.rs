use std::path::PathBuf;

use clap::Parser;
use disparity_eval::core::{EmptyCategoryPolicy, EvalOption, PlotMode};
use disparity_eval::dataset::{DatasetKind, Mode};
use disparity_eval::error::Result;
use disparity_eval::{utils, Evaluator};
use log::error;

/// 视差结果评估
#[derive(Debug, Parser)]
#[command(author, version, about = "Evaluate disparity outputs against ground truth")]
struct Args {
    /// Dataset: liu or middv3
    #[arg(long)]
    set: String,

    /// Method whose output is scored: nconv, sdr, inpaint or saab
    #[arg(long, default_value = "sdr")]
    mode: String,

    /// 0 = disabled, 1 = log EPE histograms, 2 = also save overview figures
    #[arg(long, default_value_t = 0)]
    plot: u8,

    /// End-point-error threshold (pixels) for histograms and figures
    #[arg(long, default_value_t = 20.0)]
    epethresh: f64,

    /// Dataset root directory, defaults to the dataset's standard location
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Output directory for result files and figures
    #[arg(long, value_name = "DIR", default_value = "eval_results")]
    out: PathBuf,

    /// Fail when a category has no pixels in an item instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Log level: trace, debug or info
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn try_main(args: Args) -> Result<()> {
    let kind: DatasetKind = args.set.parse()?;
    let mode: Mode = args.mode.parse()?;
    let policy = if args.strict {
        EmptyCategoryPolicy::Fail
    } else {
        EmptyCategoryPolicy::Skip
    };
    let option = EvalOption::new(PlotMode::from_level(args.plot)?, args.epethresh)
        .set_empty_category(policy)
        .set_output_dir(args.out)
        .set_data_root(args.root)
        .build();
    let mut evaluator = Evaluator::new(kind, mode, Some(option))?;
    evaluator.run()?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = utils::init_log(&args.log_level) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = try_main(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
