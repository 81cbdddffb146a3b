use image::Rgb;

/// 初始视差与真值一致性的容差(像素)
pub const CATEGORY_TOLERANCE: f64 = 4.0;

/// 像素类别, 数值即类别图中的标签
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// 0: 真值无效, 不参与任何统计
    Invalid = 0,
    /// 1: 初始视差正确
    Correct = 1,
    /// 2: 初始视差错误
    Incorrect = 2,
    /// 3: 初始视差缺失(空洞)
    Hole = 3,
}

/// 类别调色板: 灰、蓝、红、绿
pub const CATEGORY_PALETTE: [Rgb<u8>; 4] = [
    Rgb([128, 128, 128]),
    Rgb([0, 0, 255]),
    Rgb([255, 0, 0]),
    Rgb([0, 128, 0]),
];

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Invalid,
        Category::Correct,
        Category::Incorrect,
        Category::Hole,
    ];

    /// 对单个像素分类
    ///
    /// 初始视差与真值都有效时, 误差小于容差为 Correct, 否则为 Incorrect
    /// (误差恰好等于容差时归为 Incorrect)
    pub fn classify(initial: f64, ground_truth: f64) -> Self {
        if ground_truth == 0f64 {
            return Category::Invalid;
        }
        if initial == 0f64 {
            return Category::Hole;
        }
        let err = (initial.abs() - ground_truth.abs()).abs();
        if err < CATEGORY_TOLERANCE {
            Category::Correct
        } else {
            Category::Incorrect
        }
    }

    pub fn label(&self) -> u8 {
        *self as u8
    }

    pub fn from_label(label: u8) -> Option<Self> {
        Category::ALL.get(label as usize).copied()
    }

    pub fn color(&self) -> Rgb<u8> {
        CATEGORY_PALETTE[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Invalid => "Invalid",
            Category::Correct => "Category 1",
            Category::Incorrect => "Category 2",
            Category::Hole => "Category 3",
        }
    }
}
