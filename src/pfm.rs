use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use getset::{CopyGetters, Getters};
use ndarray::prelude::*;

use crate::error::{self, Error, Result};

/// PFM 浮点图像
#[derive(Getters, CopyGetters, Clone, Debug)]
pub struct PfmImage {
    /// 数据 (H x W x C), 第 0 行为图像顶部
    #[getset(get = "pub")]
    data: Array3<f32>,
    /// 比例因子(已去掉表示字节序的符号)
    #[getset(get_copy = "pub")]
    scale: f32,
}

impl PfmImage {
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }
    /// 转换为单通道视差图
    pub fn to_disparity(&self) -> Result<Array2<f64>> {
        if self.channels() != 1 {
            return Err(Error::new(2004, error::ERROR_2004));
        }
        Ok(self.data.index_axis(Axis(2), 0).mapv(|v| v as f64))
    }
}

fn read_header_line<R: BufRead>(reader: &mut R, path: &Path) -> Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(Error::with_context(
            2002,
            error::ERROR_2002,
            &path.display().to_string(),
        ));
    }
    Ok(line)
}

/// ## 读取 PFM 文件
/// 文件头:
///  * `PF`(3 通道) 或 `Pf`(单通道)
///  * `<宽> <高>`
///  * 比例因子, 负数表示小端序, 正数表示大端序
///
/// 数据按从下到上的行顺序存储, 读取后翻转为从上到下.
pub fn read_pfm<P: AsRef<Path>>(path: P) -> Result<PfmImage> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let malformed = || Error::with_context(2002, error::ERROR_2002, &path.display().to_string());

    let channels = match read_header_line(&mut reader, path)?.trim_end() {
        "PF" => 3usize,
        "Pf" => 1usize,
        _ => {
            return Err(Error::with_context(
                2001,
                error::ERROR_2001,
                &path.display().to_string(),
            ))
        }
    };
    let dim_line = read_header_line(&mut reader, path)?;
    let dims: Vec<usize> = dim_line
        .split_whitespace()
        .map(|v| v.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| malformed())?;
    if dims.len() != 2 {
        return Err(malformed());
    }
    let (width, height) = (dims[0], dims[1]);
    let scale: f32 = read_header_line(&mut reader, path)?
        .trim()
        .parse()
        .map_err(|_| malformed())?;
    let little_endian = scale < 0f32;

    // 文件头中的尺寸不可信, 溢出视为文件头损坏
    let byte_count = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(malformed)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() < byte_count {
        return Err(Error::with_context(
            2003,
            error::ERROR_2003,
            &format!("{} ({} < {})", path.display(), bytes.len(), byte_count),
        ));
    }
    let values: Vec<f32> = bytes[..byte_count]
        .chunks_exact(4)
        .map(|b| {
            let raw = [b[0], b[1], b[2], b[3]];
            if little_endian {
                f32::from_le_bytes(raw)
            } else {
                f32::from_be_bytes(raw)
            }
        })
        .collect();
    let data = Array3::from_shape_vec((height, width, channels), values).map_err(|_| malformed())?;
    // 上下翻转
    let data = data.slice(s![..;-1, .., ..]).to_owned();
    Ok(PfmImage {
        data,
        scale: scale.abs(),
    })
}

/// ## 写入单通道 PFM 文件
/// 以小端序写入(比例因子取负).
pub fn write_pfm<P: AsRef<Path>>(path: P, image: &ArrayView2<f32>, scale: f32) -> Result<()> {
    let (height, width) = image.dim();
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(b"Pf\n")?;
    writer.write_all(format!("{} {}\n", width, height).as_bytes())?;
    writer.write_all(format!("{:.6}\n", -scale.abs()).as_bytes())?;
    for row in image.slice(s![..;-1, ..]).rows() {
        for v in row.iter() {
            writer.write_all(&v.to_le_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("disp.pfm");
        let image = array![[0f32, 1.5, 2.0], [3.25, 0.0, 64.0]];
        write_pfm(&path, &image.view(), 1.0).unwrap();
        let pfm = read_pfm(&path).unwrap();
        assert_eq!(pfm.channels(), 1);
        assert_eq!(pfm.scale(), 1.0);
        let disp = pfm.to_disparity().unwrap();
        assert_eq!(disp, image.mapv(|v| v as f64));
    }

    #[test]
    fn test_read_big_endian_bottom_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("be.pfm");
        let mut bytes = b"Pf\n2 2\n1.0\n".to_vec();
        // 底行在前
        for v in [3f32, 4., 1., 2.].iter() {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        std::fs::write(&path, bytes).unwrap();
        let disp = read_pfm(&path).unwrap().to_disparity().unwrap();
        assert_eq!(disp, array![[1., 2.], [3., 4.]]);
    }

    #[test]
    fn test_color_pfm() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("color.pfm");
        let mut bytes = b"PF\n1 1\n-1.0\n".to_vec();
        for v in [1f32, 2., 3.].iter() {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(&path, bytes).unwrap();
        let pfm = read_pfm(&path).unwrap();
        assert_eq!(pfm.channels(), 3);
        assert_eq!(pfm.data()[[0, 0, 2]], 3.);
        assert_eq!(pfm.to_disparity().unwrap_err().code, 2004);
    }

    #[test]
    fn test_malformed_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.pfm");
        std::fs::write(&path, b"P6\n1 1\n255\n").unwrap();
        assert_eq!(read_pfm(&path).unwrap_err().code, 2001);
        std::fs::write(&path, b"Pf\n1 x\n-1.0\n").unwrap();
        assert_eq!(read_pfm(&path).unwrap_err().code, 2002);
        std::fs::write(&path, b"Pf\n2 2\n-1.0\n\0\0\0\0").unwrap();
        assert_eq!(read_pfm(&path).unwrap_err().code, 2003);
        assert_eq!(read_pfm(dir.path().join("missing.pfm")).unwrap_err().code, 4001);
    }

    #[test]
    fn test_oversized_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.pfm");
        // 宽 x 高 x 4 超出 usize
        std::fs::write(&path, b"Pf\n4294967296 4294967296\n-1.0\n\0\0\0\0").unwrap();
        assert_eq!(read_pfm(&path).unwrap_err().code, 2002);
        std::fs::write(&path, b"PF\n4611686018427387904 1\n-1.0\n\0\0\0\0").unwrap();
        assert_eq!(read_pfm(&path).unwrap_err().code, 2002);
        // 不溢出但远大于文件内容, 不按文件头预分配
        std::fs::write(&path, b"Pf\n100000 100000\n-1.0\n\0\0\0\0").unwrap();
        assert_eq!(read_pfm(&path).unwrap_err().code, 2003);
    }
}
