pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum GeometryError {
        #[error("invalid anchor: {0}")]
        InvalidAnchor(String),
        #[error("geometry constraint violated: {0}")]
        GeometryConstraint(String),
        #[error("grid index {index} out of range for {len} cells")]
        GridIndexOutOfRange { index: usize, len: usize },
    }

    impl GeometryError {
        pub(crate) fn constraint(message: impl Into<String>) -> Self {
            Self::GeometryConstraint(message.into())
        }
    }
}

pub mod geometry {
    use std::fmt;
    use std::str::FromStr;

    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    use crate::errors::GeometryError;

    /// 锚点系数 (ax, ay)，以矩形内部的相对坐标表示参考点。
    ///
    /// 数值不做 [0, 1] 范围校验，仅要求为有限数。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Anchor(DVec2);

    impl Anchor {
        pub const SW: Anchor = Anchor(DVec2::new(0.0, 0.0));
        pub const S: Anchor = Anchor(DVec2::new(0.5, 0.0));
        pub const SE: Anchor = Anchor(DVec2::new(1.0, 0.0));
        pub const E: Anchor = Anchor(DVec2::new(1.0, 0.5));
        pub const NE: Anchor = Anchor(DVec2::new(1.0, 1.0));
        pub const N: Anchor = Anchor(DVec2::new(0.5, 1.0));
        pub const NW: Anchor = Anchor(DVec2::new(0.0, 1.0));
        pub const W: Anchor = Anchor(DVec2::new(0.0, 0.5));
        pub const C: Anchor = Anchor(DVec2::new(0.5, 0.5));

        /// 预设锚点名称表，顺序与编辑器中的选项一致。
        pub const PRESETS: [(&'static str, Anchor); 9] = [
            ("S", Anchor::S),
            ("N", Anchor::N),
            ("W", Anchor::W),
            ("E", Anchor::E),
            ("SW", Anchor::SW),
            ("NW", Anchor::NW),
            ("NE", Anchor::NE),
            ("SE", Anchor::SE),
            ("C", Anchor::C),
        ];

        /// 以任意系数构造锚点，非有限值返回错误。
        pub fn new(ax: f64, ay: f64) -> Result<Self, GeometryError> {
            if !ax.is_finite() || !ay.is_finite() {
                return Err(GeometryError::InvalidAnchor(format!(
                    "coefficients must be finite, got ({ax}, {ay})"
                )));
            }
            Ok(Self(DVec2::new(ax, ay)))
        }

        /// 按预设名称查找锚点（不区分大小写）。
        pub fn from_name(name: &str) -> Option<Self> {
            let name = name.trim();
            Self::PRESETS
                .iter()
                .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
                .map(|(_, anchor)| *anchor)
        }

        /// 若系数恰好对应某个预设，返回其名称。
        pub fn name(self) -> Option<&'static str> {
            Self::PRESETS
                .iter()
                .find(|(_, anchor)| *anchor == self)
                .map(|(name, _)| *name)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl Default for Anchor {
        fn default() -> Self {
            Anchor::C
        }
    }

    impl fmt::Display for Anchor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{},{}", self.x(), self.y()),
            }
        }
    }

    /// 接受预设名称（如 `NE`）或 `"ax,ay"` 形式的系数对。
    impl FromStr for Anchor {
        type Err = GeometryError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            if let Some(anchor) = Self::from_name(s) {
                return Ok(anchor);
            }
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 2 {
                return Err(GeometryError::InvalidAnchor(format!(
                    "unknown anchor name `{}`",
                    s.trim()
                )));
            }
            let parse = |raw: &str| {
                raw.parse::<f64>().map_err(|_| {
                    GeometryError::InvalidAnchor(format!("`{raw}` is not a number"))
                })
            };
            Self::new(parse(parts[0])?, parse(parts[1])?)
        }
    }

    impl TryFrom<&[f64]> for Anchor {
        type Error = GeometryError;

        fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
            match value {
                [ax, ay] => Self::new(*ax, *ay),
                other => Err(GeometryError::InvalidAnchor(format!(
                    "expected 2 coefficients, got {}",
                    other.len()
                ))),
            }
        }
    }

    /// 图幅物理尺寸（英寸），用于把轴的相对尺寸换算为真实长宽比。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct FigureSize {
        width: f64,
        height: f64,
    }

    impl FigureSize {
        pub fn new(width: f64, height: f64) -> Result<Self, GeometryError> {
            let valid = |v: f64| v.is_finite() && v > 0.0;
            if !valid(width) || !valid(height) {
                return Err(GeometryError::constraint(format!(
                    "figure size must be positive, got {width} x {height}"
                )));
            }
            Ok(Self { width, height })
        }

        #[inline]
        pub fn width(self) -> f64 {
            self.width
        }

        #[inline]
        pub fn height(self) -> f64 {
            self.height
        }

        /// 图幅长宽比 width / height。
        #[inline]
        pub fn aspect(self) -> f64 {
            self.width / self.height
        }
    }

    impl Default for FigureSize {
        fn default() -> Self {
            Self {
                width: 8.0,
                height: 6.0,
            }
        }
    }

    /// 拆分方向：`Horizontal` 沿宽度拆分，`Vertical` 沿高度拆分。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SplitAxis {
        Horizontal,
        Vertical,
    }

    impl FromStr for SplitAxis {
        type Err = GeometryError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "h" | "horizontal" | "w" | "width" => Ok(SplitAxis::Horizontal),
                "v" | "vertical" | "height" => Ok(SplitAxis::Vertical),
                other => Err(GeometryError::constraint(format!(
                    "unknown split axis `{other}`"
                ))),
            }
        }
    }

    /// 绝对边界 (xll, yll, w, h)：左下角与宽高，单位为图幅比例。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds {
        origin: DVec2,
        size: DVec2,
    }

    impl Bounds {
        #[inline]
        pub fn new(xll: f64, yll: f64, width: f64, height: f64) -> Self {
            Self {
                origin: DVec2::new(xll, yll),
                size: DVec2::new(width, height),
            }
        }

        #[inline]
        pub fn from_vecs(origin: DVec2, size: DVec2) -> Self {
            Self { origin, size }
        }

        /// 由左下角与右上角构造。
        #[inline]
        pub fn from_corners(lower_left: DVec2, upper_right: DVec2) -> Self {
            Self {
                origin: lower_left,
                size: upper_right - lower_left,
            }
        }

        #[inline]
        pub fn xll(&self) -> f64 {
            self.origin.x
        }

        #[inline]
        pub fn yll(&self) -> f64 {
            self.origin.y
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.size.x
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.size.y
        }

        #[inline]
        pub fn origin(&self) -> DVec2 {
            self.origin
        }

        #[inline]
        pub fn size(&self) -> DVec2 {
            self.size
        }

        #[inline]
        pub fn upper_right(&self) -> DVec2 {
            self.origin + self.size
        }

        #[inline]
        pub fn to_array(&self) -> [f64; 4] {
            [self.origin.x, self.origin.y, self.size.x, self.size.y]
        }

        /// 锚点在图幅中的绝对坐标：origin + size * coef。
        #[inline]
        pub fn anchor_point(&self, anchor: Anchor) -> DVec2 {
            self.origin + self.size * anchor.as_vec2()
        }

        /// 由锚点坐标与尺寸反求左下角。
        #[inline]
        pub fn from_anchor_point(point: DVec2, size: DVec2, anchor: Anchor) -> Self {
            Self {
                origin: point - size * anchor.as_vec2(),
                size,
            }
        }

        /// 两个边界的并集包围盒，按绝对（左下角）坐标计算。
        pub fn union(&self, other: &Bounds) -> Bounds {
            let lower_left = self.origin.min(other.origin);
            let upper_right = self.upper_right().max(other.upper_right());
            Bounds::from_corners(lower_left, upper_right)
        }

        pub fn approx_eq(&self, other: &Bounds, eps: f64) -> bool {
            self.origin.abs_diff_eq(other.origin, eps) && self.size.abs_diff_eq(other.size, eps)
        }

        /// 沿指定方向把边界拆成两段，中间留出 `spacing` 间隔。
        ///
        /// 第一段保持原左下角，第二段紧随间隔之后。
        pub fn split(
            &self,
            ratio: f64,
            spacing: f64,
            axis: SplitAxis,
        ) -> Result<(Bounds, Bounds), GeometryError> {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(GeometryError::constraint(format!(
                    "ratio must be between 0 and 1, got {ratio}"
                )));
            }
            if !spacing.is_finite() || spacing < 0.0 {
                return Err(GeometryError::constraint(format!(
                    "spacing must be a non-negative number, got {spacing}"
                )));
            }
            let size = match axis {
                SplitAxis::Horizontal => self.width(),
                SplitAxis::Vertical => self.height(),
            };
            if spacing >= size {
                return Err(GeometryError::constraint(format!(
                    "spacing {spacing} too large, cannot split extent {size}"
                )));
            }

            let size1 = (size - spacing) * ratio;
            let size2 = (size - spacing) * (1.0 - ratio);

            let (first, second) = match axis {
                SplitAxis::Horizontal => (
                    Bounds::new(self.xll(), self.yll(), size1, self.height()),
                    Bounds::new(
                        self.xll() + size1 + spacing,
                        self.yll(),
                        size2,
                        self.height(),
                    ),
                ),
                SplitAxis::Vertical => (
                    Bounds::new(self.xll(), self.yll(), self.width(), size1),
                    Bounds::new(
                        self.xll(),
                        self.yll() + size1 + spacing,
                        self.width(),
                        size2,
                    ),
                ),
            };
            Ok((first, second))
        }
    }

    impl fmt::Display for Bounds {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{:.2}, {:.2}, {:.2}, {:.2}",
                self.xll(),
                self.yll(),
                self.width(),
                self.height()
            )
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn anchor_presets_parse_by_name_and_pair() {
            assert_eq!("NE".parse::<Anchor>().unwrap(), Anchor::NE);
            assert_eq!("sw".parse::<Anchor>().unwrap(), Anchor::SW);
            let custom: Anchor = "0.25, 0.75".parse().unwrap();
            assert_eq!(custom.x(), 0.25);
            assert_eq!(custom.y(), 0.75);
            assert_eq!(custom.name(), None);
            assert_eq!(Anchor::C.to_string(), "C");
            assert_eq!(custom.to_string(), "0.25,0.75");
        }

        #[test]
        fn anchor_rejects_unknown_or_malformed_values() {
            assert!(matches!(
                "NNE".parse::<Anchor>(),
                Err(GeometryError::InvalidAnchor(_))
            ));
            assert!(matches!(
                "0.5,x".parse::<Anchor>(),
                Err(GeometryError::InvalidAnchor(_))
            ));
            assert!(matches!(
                Anchor::try_from(&[0.5, 0.5, 0.5][..]),
                Err(GeometryError::InvalidAnchor(_))
            ));
            assert!(Anchor::new(f64::NAN, 0.0).is_err());
            assert_eq!(Anchor::try_from(&[1.0, 0.0][..]).unwrap(), Anchor::SE);
        }

        #[test]
        fn figure_size_requires_positive_extent() {
            assert!(FigureSize::new(0.0, 6.0).is_err());
            assert!(FigureSize::new(6.0, -1.0).is_err());
            let size = FigureSize::new(8.0, 4.0).unwrap();
            assert!((size.aspect() - 2.0).abs() < f64::EPSILON);
        }

        #[test]
        fn union_covers_both_bounds() {
            let a = Bounds::new(0.0, 0.0, 0.2, 0.2);
            let b = Bounds::new(0.3, 0.3, 0.2, 0.2);
            let u = a.union(&b);
            assert!(u.approx_eq(&Bounds::new(0.0, 0.0, 0.5, 0.5), 1e-12));
        }

        #[test]
        fn split_partitions_with_spacing() {
            let bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
            let (first, second) = bounds.split(0.5, 0.1, SplitAxis::Horizontal).unwrap();
            assert!(first.approx_eq(&Bounds::new(0.0, 0.0, 0.45, 1.0), 1e-12));
            assert!(second.approx_eq(&Bounds::new(0.55, 0.0, 0.45, 1.0), 1e-12));

            let (low, high) = bounds.split(0.25, 0.0, SplitAxis::Vertical).unwrap();
            assert!(low.approx_eq(&Bounds::new(0.0, 0.0, 1.0, 0.25), 1e-12));
            assert!(high.approx_eq(&Bounds::new(0.0, 0.25, 1.0, 0.75), 1e-12));

            assert!(matches!(
                bounds.split(0.5, 1.5, SplitAxis::Horizontal),
                Err(GeometryError::GeometryConstraint(_))
            ));
            assert!(bounds.split(1.5, 0.1, SplitAxis::Horizontal).is_err());
            assert!(bounds.split(-0.1, 0.1, SplitAxis::Horizontal).is_err());
        }

        #[test]
        fn split_accepts_closed_ratio_range() {
            let bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);

            let (empty, full) = bounds.split(0.0, 0.1, SplitAxis::Horizontal).unwrap();
            assert_eq!(empty.width(), 0.0);
            assert!(full.approx_eq(&Bounds::new(0.1, 0.0, 0.9, 1.0), 1e-12));

            let (full, empty) = bounds.split(1.0, 0.1, SplitAxis::Horizontal).unwrap();
            assert!(full.approx_eq(&Bounds::new(0.0, 0.0, 0.9, 1.0), 1e-12));
            assert!(empty.width().abs() < 1e-12);
        }

        #[test]
        fn split_axis_parses_short_names() {
            assert_eq!("h".parse::<SplitAxis>().unwrap(), SplitAxis::Horizontal);
            assert_eq!("Vertical".parse::<SplitAxis>().unwrap(), SplitAxis::Vertical);
            assert!("diagonal".parse::<SplitAxis>().is_err());
        }
    }
}

pub mod rect {
    use glam::DVec2;

    use crate::errors::GeometryError;
    use crate::geometry::{Anchor, Bounds, FigureSize, SplitAxis};

    /// 以锚点为参考的矩形：读写 x/y/w/h 时保持锚点在图幅中的位置不变。
    ///
    /// 图幅尺寸不随矩形保存，涉及真实长宽比的操作需显式传入 [`FigureSize`]。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct RectAnchor {
        bounds: Bounds,
        anchor: Anchor,
        locked_aspect: bool,
    }

    impl RectAnchor {
        pub fn new(bounds: Bounds, anchor: Anchor) -> Self {
            Self {
                bounds,
                anchor,
                locked_aspect: false,
            }
        }

        pub fn with_locked_aspect(mut self, locked: bool) -> Self {
            self.locked_aspect = locked;
            self
        }

        /// 由锚点相对的位置与尺寸构造，反求左下角。
        pub fn from_position(x: f64, y: f64, w: f64, h: f64, anchor: Anchor) -> Self {
            let bounds = Bounds::from_anchor_point(DVec2::new(x, y), DVec2::new(w, h), anchor);
            Self::new(bounds, anchor)
        }

        #[inline]
        pub fn bounds(&self) -> Bounds {
            self.bounds
        }

        /// 直接写入绝对边界，不做校验。
        #[inline]
        pub fn set_bounds(&mut self, bounds: Bounds) {
            self.bounds = bounds;
        }

        #[inline]
        pub fn anchor(&self) -> Anchor {
            self.anchor
        }

        /// 更换锚点只影响后续的相对坐标读取，边界保持不变。
        #[inline]
        pub fn set_anchor(&mut self, anchor: Anchor) {
            self.anchor = anchor;
        }

        #[inline]
        pub fn is_aspect_locked(&self) -> bool {
            self.locked_aspect
        }

        #[inline]
        pub fn lock_aspect(&mut self, locked: bool) {
            self.locked_aspect = locked;
        }

        #[inline]
        pub fn x(&self) -> f64 {
            self.bounds.anchor_point(self.anchor).x
        }

        #[inline]
        pub fn y(&self) -> f64 {
            self.bounds.anchor_point(self.anchor).y
        }

        #[inline]
        pub fn w(&self) -> f64 {
            self.bounds.width()
        }

        #[inline]
        pub fn h(&self) -> f64 {
            self.bounds.height()
        }

        pub fn set_x(&mut self, x: f64) {
            let xll = x - self.anchor.x() * self.w();
            self.bounds = Bounds::new(xll, self.bounds.yll(), self.w(), self.h());
        }

        pub fn set_y(&mut self, y: f64) {
            let yll = y - self.anchor.y() * self.h();
            self.bounds = Bounds::new(self.bounds.xll(), yll, self.w(), self.h());
        }

        /// 设置宽度并保持锚点 x 坐标；锁定长宽比时按修改前的比例联动高度。
        pub fn set_w(&mut self, w: f64) -> Result<(), GeometryError> {
            let mut next = self.resized(Dimension::Width, w);
            if self.locked_aspect {
                let h = w / self.axaspect()?;
                next = next.resized(Dimension::Height, h);
            }
            *self = next;
            Ok(())
        }

        /// 设置高度并保持锚点 y 坐标；锁定长宽比时按修改前的比例联动宽度。
        pub fn set_h(&mut self, h: f64) -> Result<(), GeometryError> {
            let mut next = self.resized(Dimension::Height, h);
            if self.locked_aspect {
                let w = h * self.axaspect()?;
                next = next.resized(Dimension::Width, w);
            }
            *self = next;
            Ok(())
        }

        /// 图幅坐标下的宽高比 w / h。
        pub fn axaspect(&self) -> Result<f64, GeometryError> {
            if self.h().abs() <= f64::EPSILON {
                return Err(GeometryError::constraint("height is zero, aspect undefined"));
            }
            let ratio = self.w() / self.h();
            if !ratio.is_finite() || ratio.abs() <= f64::EPSILON {
                return Err(GeometryError::constraint(format!(
                    "degenerate axes aspect {ratio}"
                )));
            }
            Ok(ratio)
        }

        /// 真实长宽比：图幅长宽比乘以 w / h。
        pub fn aspect(&self, figure: FigureSize) -> Result<f64, GeometryError> {
            if self.h().abs() <= f64::EPSILON {
                return Err(GeometryError::constraint("height is zero, aspect undefined"));
            }
            Ok(figure.aspect() * (self.w() / self.h()))
        }

        pub fn set_aspect(&mut self, figure: FigureSize, aspect: f64) -> Result<(), GeometryError> {
            self.set_aspect_ratio(figure, aspect, false)
        }

        /// 通过调整高度（默认）或宽度（`fix_height`）达到目标真实长宽比。
        ///
        /// 被调整的一边经由 `set_h` / `set_w` 写入，锁定长宽比时同样联动另一边。
        pub fn set_aspect_ratio(
            &mut self,
            figure: FigureSize,
            aspect: f64,
            fix_height: bool,
        ) -> Result<(), GeometryError> {
            let axaspect = aspect / figure.aspect();
            if !axaspect.is_finite() || axaspect <= 0.0 {
                return Err(GeometryError::constraint(format!(
                    "aspect must be a positive number, got {aspect}"
                )));
            }
            if fix_height {
                self.set_w(self.h() * axaspect)
            } else {
                self.set_h(self.w() / axaspect)
            }
        }

        /// 按比例拆分：自身变为第一段，返回第二段的边界。
        pub fn split(
            &mut self,
            ratio: f64,
            spacing: f64,
            axis: SplitAxis,
        ) -> Result<Bounds, GeometryError> {
            let (first, second) = self.bounds.split(ratio, spacing, axis)?;
            self.bounds = first;
            Ok(second)
        }

        fn resized(&self, dimension: Dimension, value: f64) -> Self {
            let coef = self.anchor.as_vec2();
            let mut origin = self.bounds.origin();
            let mut size = self.bounds.size();
            match dimension {
                Dimension::Width => {
                    origin.x += coef.x * (size.x - value);
                    size.x = value;
                }
                Dimension::Height => {
                    origin.y += coef.y * (size.y - value);
                    size.y = value;
                }
            }
            Self {
                bounds: Bounds::from_vecs(origin, size),
                ..*self
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Dimension {
        Width,
        Height,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const EPS: f64 = 1e-9;

        fn square_figure() -> FigureSize {
            FigureSize::new(6.0, 6.0).unwrap()
        }

        fn coefficient_grid() -> Vec<Anchor> {
            let steps = [0.0, 0.5, 1.0];
            steps
                .iter()
                .flat_map(|ax| steps.iter().map(move |ay| Anchor::new(*ax, *ay).unwrap()))
                .collect()
        }

        fn assert_close(actual: f64, expected: f64) {
            assert!(
                (actual - expected).abs() < EPS,
                "expected {expected}, got {actual}"
            );
        }

        #[test]
        fn named_anchor_positions_follow_bounds() {
            let bounds = Bounds::new(0.1, 0.1, 0.8, 0.8);
            let mut rect = RectAnchor::new(bounds, Anchor::C);
            assert_close(rect.x(), 0.5);
            assert_close(rect.y(), 0.5);
            assert_close(rect.w(), 0.8);
            assert_close(rect.h(), 0.8);

            rect.set_anchor(Anchor::SW);
            assert_close(rect.x(), 0.1);
            assert_close(rect.y(), 0.1);

            rect.set_anchor(Anchor::NE);
            assert_close(rect.x(), 0.9);
            assert_close(rect.y(), 0.9);

            rect.set_anchor(Anchor::NW);
            assert_close(rect.x(), 0.1);
            assert_close(rect.y(), 0.9);

            rect.set_anchor(Anchor::SE);
            assert_close(rect.x(), 0.9);
            assert_close(rect.y(), 0.1);
            assert_eq!(rect.bounds(), bounds);
        }

        #[test]
        fn anchor_round_trip_recovers_lower_left() {
            let samples = [
                Bounds::new(0.1, 0.2, 0.3, 0.4),
                Bounds::new(-0.5, 0.75, 1.25, 0.05),
                Bounds::new(0.0, 0.0, 1.0, 1.0),
            ];
            for bounds in samples {
                for anchor in coefficient_grid() {
                    let rect = RectAnchor::new(bounds, anchor);
                    let rebuilt = RectAnchor::from_position(
                        rect.x(),
                        rect.y(),
                        rect.w(),
                        rect.h(),
                        anchor,
                    );
                    assert!(rebuilt.bounds().approx_eq(&bounds, EPS), "{anchor:?}");
                }
            }
        }

        #[test]
        fn changing_anchor_keeps_size() {
            let bounds = Bounds::new(0.2, 0.1, 0.4, 0.6);
            let mut rect = RectAnchor::new(bounds, Anchor::SW);
            for anchor in coefficient_grid() {
                rect.set_anchor(anchor);
                assert_eq!(rect.w(), 0.4);
                assert_eq!(rect.h(), 0.6);
                assert_close(rect.x(), 0.2 + anchor.x() * 0.4);
                assert_close(rect.y(), 0.1 + anchor.y() * 0.6);
            }
        }

        #[test]
        fn setting_position_moves_lower_left() {
            let mut rect = RectAnchor::new(Bounds::new(0.1, 0.1, 0.8, 0.8), Anchor::C);
            rect.set_x(0.6);
            rect.set_y(0.4);
            assert!(
                rect.bounds()
                    .approx_eq(&Bounds::new(0.2, 0.0, 0.8, 0.8), EPS)
            );
        }

        #[test]
        fn resize_preserves_anchor_point() {
            for anchor in coefficient_grid() {
                let mut rect = RectAnchor::new(Bounds::new(0.1, 0.2, 0.6, 0.5), anchor);
                let (x0, y0) = (rect.x(), rect.y());
                rect.set_w(0.3).unwrap();
                rect.set_h(0.2).unwrap();
                assert_close(rect.x(), x0);
                assert_close(rect.y(), y0);
                assert_close(rect.w(), 0.3);
                assert_close(rect.h(), 0.2);
            }
        }

        #[test]
        fn locked_aspect_cascades_into_other_dimension() {
            let figure = square_figure();
            let mut rect =
                RectAnchor::new(Bounds::new(0.1, 0.1, 0.8, 0.8), Anchor::C).with_locked_aspect(true);
            assert_close(rect.aspect(figure).unwrap(), 1.0);

            rect.set_w(0.4).unwrap();
            assert_close(rect.w(), 0.4);
            assert_close(rect.h(), 0.4);
            assert_close(rect.x(), 0.5);
            assert_close(rect.y(), 0.5);
            assert!(
                rect.bounds()
                    .approx_eq(&Bounds::new(0.3, 0.3, 0.4, 0.4), EPS)
            );
        }

        #[test]
        fn locked_aspect_preserves_non_square_ratio() {
            let mut rect =
                RectAnchor::new(Bounds::new(0.0, 0.0, 0.8, 0.4), Anchor::SW).with_locked_aspect(true);
            rect.set_w(0.4).unwrap();
            assert_close(rect.h(), 0.2);

            rect.set_h(0.3).unwrap();
            assert_close(rect.w(), 0.6);
            assert_close(rect.axaspect().unwrap(), 2.0);
        }

        #[test]
        fn lock_does_not_correct_existing_shape() {
            let bounds = Bounds::new(0.0, 0.0, 0.8, 0.4);
            let mut rect = RectAnchor::new(bounds, Anchor::C);
            rect.lock_aspect(true);
            assert!(rect.is_aspect_locked());
            assert_eq!(rect.bounds(), bounds);
        }

        #[test]
        fn locked_resize_of_flat_rect_is_rejected_without_change() {
            let bounds = Bounds::new(0.0, 0.0, 0.8, 0.0);
            let mut rect = RectAnchor::new(bounds, Anchor::C).with_locked_aspect(true);
            assert!(matches!(
                rect.set_w(0.4),
                Err(GeometryError::GeometryConstraint(_))
            ));
            assert_eq!(rect.bounds(), bounds);
        }

        #[test]
        fn aspect_setter_solves_height_or_width() {
            let figure = FigureSize::new(8.0, 4.0).unwrap();
            let mut rect = RectAnchor::new(Bounds::new(0.1, 0.1, 0.4, 0.4), Anchor::SW);
            assert_close(rect.aspect(figure).unwrap(), 2.0);

            rect.set_aspect(figure, 1.0).unwrap();
            assert_close(rect.w(), 0.4);
            assert_close(rect.h(), 0.8);
            assert_close(rect.aspect(figure).unwrap(), 1.0);

            rect.set_aspect_ratio(figure, 4.0, true).unwrap();
            assert_close(rect.h(), 0.8);
            assert_close(rect.w(), 1.6);
            assert_close(rect.aspect(figure).unwrap(), 4.0);
        }

        #[test]
        fn aspect_setter_cascades_through_lock() {
            let figure = square_figure();
            let mut rect =
                RectAnchor::new(Bounds::new(0.0, 0.0, 0.4, 0.4), Anchor::SW).with_locked_aspect(true);
            rect.set_aspect(figure, 2.0).unwrap();
            assert_close(rect.h(), 0.2);
            assert_close(rect.w(), 0.2);
            assert_close(rect.aspect(figure).unwrap(), 1.0);

            let mut rect =
                RectAnchor::new(Bounds::new(0.0, 0.0, 0.4, 0.4), Anchor::N).with_locked_aspect(true);
            rect.set_aspect(figure, 2.0).unwrap();
            assert!(rect.bounds().approx_eq(&Bounds::new(0.1, 0.2, 0.2, 0.2), EPS));
            // anchor N keeps the top edge centre in place
            assert_close(rect.x(), 0.2);
            assert_close(rect.y(), 0.4);

            let mut rect =
                RectAnchor::new(Bounds::new(0.0, 0.0, 0.4, 0.2), Anchor::SW).with_locked_aspect(true);
            rect.set_aspect_ratio(figure, 1.0, true).unwrap();
            assert_close(rect.w(), 0.2);
            assert_close(rect.h(), 0.1);
        }

        #[test]
        fn aspect_rejects_degenerate_values() {
            let figure = square_figure();
            let mut rect = RectAnchor::new(Bounds::new(0.0, 0.0, 0.4, 0.0), Anchor::C);
            assert!(rect.aspect(figure).is_err());
            assert!(rect.axaspect().is_err());

            rect.set_bounds(Bounds::new(0.0, 0.0, 0.4, 0.4));
            assert!(rect.set_aspect(figure, 0.0).is_err());
            assert!(rect.set_aspect(figure, f64::NAN).is_err());
            assert_eq!(rect.bounds(), Bounds::new(0.0, 0.0, 0.4, 0.4));
        }

        #[test]
        fn split_shrinks_self_and_returns_second_part() {
            let mut rect = RectAnchor::new(Bounds::new(0.0, 0.0, 1.0, 1.0), Anchor::SW);
            let second = rect.split(0.5, 0.1, SplitAxis::Horizontal).unwrap();
            assert_close(rect.x(), 0.0);
            assert_close(rect.w(), 0.45);
            assert!(second.approx_eq(&Bounds::new(0.55, 0.0, 0.45, 1.0), EPS));

            let before = rect.bounds();
            assert!(matches!(
                rect.split(0.5, 1.5, SplitAxis::Horizontal),
                Err(GeometryError::GeometryConstraint(_))
            ));
            assert_eq!(rect.bounds(), before);
        }
    }
}

pub mod layout {
    use glam::DVec2;

    use crate::errors::GeometryError;
    use crate::geometry::{Bounds, FigureSize};

    /// 子图网格参数，语义与 matplotlib 的 `GridSpec` 一致：
    /// `wspace`/`hspace` 为相对平均单元宽/高的间距，单元按行优先、自左上角编号。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GridSpec {
        pub nrows: usize,
        pub ncols: usize,
        pub left: f64,
        pub bottom: f64,
        pub right: f64,
        pub top: f64,
        pub wspace: f64,
        pub hspace: f64,
    }

    impl GridSpec {
        pub fn new(nrows: usize, ncols: usize) -> Self {
            Self {
                nrows,
                ncols,
                ..Self::default()
            }
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.nrows * self.ncols
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn validate(&self) -> Result<(), GeometryError> {
            if self.is_empty() {
                return Err(GeometryError::GeometryConstraint(format!(
                    "grid needs at least one row and column, got {}x{}",
                    self.nrows, self.ncols
                )));
            }
            if self.right <= self.left || self.top <= self.bottom {
                return Err(GeometryError::GeometryConstraint(
                    "grid box must have positive width and height".to_string(),
                ));
            }
            if self.wspace < 0.0 || self.hspace < 0.0 {
                return Err(GeometryError::GeometryConstraint(
                    "grid spacing must be non-negative".to_string(),
                ));
            }
            Ok(())
        }

        fn cell_size(&self) -> (DVec2, DVec2) {
            let (rows, cols) = (self.nrows as f64, self.ncols as f64);
            let cell_w = (self.right - self.left) / (cols + self.wspace * (cols - 1.0));
            let cell_h = (self.top - self.bottom) / (rows + self.hspace * (rows - 1.0));
            let size = DVec2::new(cell_w, cell_h);
            let step = DVec2::new(cell_w * (1.0 + self.wspace), cell_h * (1.0 + self.hspace));
            (size, step)
        }

        /// 第 `index` 个单元的边界。
        pub fn cell(&self, index: usize) -> Result<Bounds, GeometryError> {
            self.validate()?;
            if index >= self.len() {
                return Err(GeometryError::GridIndexOutOfRange {
                    index,
                    len: self.len(),
                });
            }
            let (size, step) = self.cell_size();
            let row = (index / self.ncols) as f64;
            let col = (index % self.ncols) as f64;
            let xll = self.left + col * step.x;
            let yll = self.top - row * step.y - size.y;
            Ok(Bounds::new(xll, yll, size.x, size.y))
        }

        pub fn cells(&self) -> Result<Vec<Bounds>, GeometryError> {
            (0..self.len()).map(|index| self.cell(index)).collect()
        }
    }

    impl Default for GridSpec {
        fn default() -> Self {
            Self {
                nrows: 1,
                ncols: 1,
                left: 0.1,
                bottom: 0.1,
                right: 0.9,
                top: 0.9,
                wspace: 0.05,
                hspace: 0.05,
            }
        }
    }

    /// 固定图宽下的子图排布，返回所需图幅与逐行（自上而下）的边界。
    ///
    /// `hpad`/`vpad` 为图幅比例下的绝对间距，`frame` 为 (xll, yll, xur, yur)。
    pub fn hsubplots(
        figwidth: f64,
        shape: (usize, usize),
        hpad: f64,
        vpad: f64,
        frame: [f64; 4],
        ax_aspect: f64,
    ) -> Result<(FigureSize, Vec<Vec<Bounds>>), GeometryError> {
        let (rows, cols) = shape;
        if rows == 0 || cols == 0 {
            return Err(GeometryError::GeometryConstraint(format!(
                "subplot shape must be non-empty, got {rows}x{cols}"
            )));
        }
        let [x0, y0, x1, y1] = frame;
        let axwidth = (x1 - x0 - hpad * (cols as f64 - 1.0)) / cols as f64;
        let axheight = (y1 - y0 - vpad * (rows as f64 - 1.0)) / rows as f64;
        if axwidth <= 0.0 || axheight <= 0.0 {
            return Err(GeometryError::GeometryConstraint(
                "padding leaves no room for subplots".to_string(),
            ));
        }
        let figheight = figwidth * (axwidth / axheight) * ax_aspect;
        let figure = FigureSize::new(figwidth, figheight)?;

        let mut positions: Vec<Vec<Bounds>> = (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| {
                        let x = x0 + j as f64 * (axwidth + hpad);
                        let y = y0 + i as f64 * (axheight + vpad);
                        Bounds::new(x, y, axwidth, axheight)
                    })
                    .collect()
            })
            .collect();
        positions.reverse();
        Ok((figure, positions))
    }

}

pub use errors::GeometryError;
pub use geometry::{Anchor, Bounds, FigureSize, SplitAxis};
pub use rect::RectAnchor;
