use std::{fmt, io};

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn new(code: i32, message: &str) -> Self {
        Self {
            code: code,
            message: message.to_string(),
        }
    }
    /// 带上下文(文件路径、条目名称等)的错误
    pub fn with_context(code: i32, message: &str, context: &str) -> Self {
        Self {
            code: code,
            message: format!("{}: {}", message, context),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::with_context(4001, ERROR_4001, &e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::with_context(4002, ERROR_4002, &e.to_string())
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

pub static ERROR_1001: &'static str = "Disparity map mean must be strictly positive";
pub static ERROR_1002: &'static str = "Disparity map must contain at least one invalid (zero) pixel";
pub static ERROR_1003: &'static str = "Disparity maps must share the same dimensions";
pub static ERROR_1004: &'static str = "Category contains no pixels, statistic is undefined";
pub static ERROR_1005: &'static str = "Evaluation item results are not set";
pub static ERROR_1006: &'static str = "Evaluation item data must be set before results";
pub static ERROR_1007: &'static str = "Evaluation item data or results are already set";

pub static ERROR_2001: &'static str = "Not a PFM file";
pub static ERROR_2002: &'static str = "Malformed PFM header";
pub static ERROR_2003: &'static str = "PFM data is shorter than its header declares";
pub static ERROR_2004: &'static str = "Color PFM can not be used as a disparity map";

pub static ERROR_3001: &'static str = "Unsupported dataset, expected one of [liu, middv3]";
pub static ERROR_3002: &'static str = "Unsupported mode, expected one of [nconv, sdr, inpaint, saab]";
pub static ERROR_3003: &'static str = "NCONV results are only available for the LIU dataset";
pub static ERROR_3004: &'static str = "End-point-error threshold must be a positive value";
pub static ERROR_3005: &'static str = "Unsupported plot mode, expected one of [0, 1, 2]";
pub static ERROR_3006: &'static str = "Failed to initialize logger";
pub static ERROR_3007: &'static str = "Failed to draw figure";
pub static ERROR_3008: &'static str = "Dataset item does not belong to this dataset";

pub static ERROR_4001: &'static str = "I/O error";
pub static ERROR_4002: &'static str = "Image error";
