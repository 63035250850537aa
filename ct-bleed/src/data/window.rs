use crate::ScanSlice;

/// 由切片自身的最小值和最大值确定的显示窗口.
///
/// 窗口把 `[min, max]` 线性映射到 `[0, 1]`, 计算式为
/// `(x - min) / (max - min + eps)`. `eps` 保证均匀切片也不会除零.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MinMaxWindow {
    min: f32,
    max: f32,
    eps: f32,
}

impl MinMaxWindow {
    /// 以 `slice` 中有限像素的最小值和最大值构建窗口.
    ///
    /// 若切片中没有有限像素, 则退化为 `[0, 0]` 窗口 (所有像素映射为 0).
    pub fn from_slice(slice: &ScanSlice<'_>, eps: f32) -> MinMaxWindow {
        let (min, max) = slice.min_max().unwrap_or((0.0, 0.0));
        Self {
            min,
            max,
            eps: eps.max(0.0),
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.min
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.max
    }

    /// 归一化分母 `max - min + eps`.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max - self.min + self.eps
    }

    /// 求 `x` 对应的归一化值 (0.0 <= value <= 1.0).
    ///
    /// 如果 `x` 无意义 (如 inf, NaN), 或窗口宽度为 0, 则返回 0.0.
    pub fn eval_unit(&self, x: f32) -> f32 {
        let width = self.width();
        if !x.is_finite() || width <= 0.0 {
            return 0.0;
        }
        ((x - self.min) / width).clamp(0.0, 1.0)
    }

    /// 求 `x` 对应的灰度图像素整数值 (0 <= value <= 255). 小数部分直接截断.
    #[inline]
    pub fn eval(&self, x: f32) -> u8 {
        // 255, not 256.
        (self.eval_unit(x) * 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::MinMaxWindow;
    use crate::ScanSlice;
    use ndarray::arr2;

    fn window(min: f32, max: f32, eps: f32) -> MinMaxWindow {
        MinMaxWindow { min, max, eps }
    }

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_window_from_slice() {
        let data = arr2(&[[f32::NAN, -3.0], [8.0, f32::INFINITY]]);
        let win = MinMaxWindow::from_slice(&ScanSlice::new(0, data.view()), -1.0);
        assert_eq!(win.lower_bound(), -3.0);
        assert_eq!(win.upper_bound(), 8.0);
        assert_eq!(win.width(), 11.0);

        let empty = arr2(&[[f32::NAN, f32::NEG_INFINITY]]);
        let win = MinMaxWindow::from_slice(&ScanSlice::new(0, empty.view()), 0.0);
        assert_eq!(win.width(), 0.0);
        assert_eq!(win.eval(1.0), 0);
    }

    #[test]
    fn test_window_generic() {
        // [60, 100]
        let win = window(60.0, 100.0, 0.0);
        assert_eq!(win.eval(f32::NAN), 0);
        assert_eq!(win.eval(f32::MIN), 0);
        assert_eq!(win.eval(f32::MAX), 255);

        assert_eq!(win.eval(60.0), 0);
        assert!(float_eq(win.eval_unit(70.0), 0.25));
        assert_eq!(win.eval(70.0), (255.0 * 0.25) as u8);
        assert_eq!(win.eval(80.0), (255.0 * 0.5) as u8);
        assert_eq!(win.eval(99.999), 254);
        assert_eq!(win.eval(100.0), u8::MAX);
    }

    #[test]
    fn test_window_uniform() {
        let win = window(5.0, 5.0, 1e-6);
        assert_eq!(win.eval_unit(5.0), 0.0);

        let degenerate = window(5.0, 5.0, 0.0);
        assert_eq!(degenerate.eval_unit(5.0), 0.0);
        assert!(degenerate.eval_unit(7.0).is_finite());
    }

    #[test]
    fn test_window_eps_shrinks_top() {
        let win = window(0.0, 1.0, 1.0);
        assert!(float_eq(win.eval_unit(1.0), 0.5));
        assert_eq!(win.eval(1.0), 127);
    }
}
