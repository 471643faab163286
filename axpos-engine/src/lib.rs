pub mod command;

pub mod errors {
    use axpos_core::GeometryError;
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum EngineError {
        #[error("axes `{0}` not found")]
        RectNotFound(String),
        #[error("no free axes name left (capacity {0})")]
        NameCapacityExhausted(usize),
        #[error("new order is not a permutation of the current axes names")]
        PermutationMismatch,
        #[error("row {row} out of range ({len} axes)")]
        RowOutOfRange { row: usize, len: usize },
        #[error("unsupported property `{0}`")]
        UnsupportedProperty(String),
        #[error(transparent)]
        Geometry(#[from] GeometryError),
    }
}

pub mod rect_set {
    use std::collections::HashSet;
    use std::fmt;
    use std::str::FromStr;

    use axpos_core::layout::GridSpec;
    use axpos_core::{Anchor, Bounds, FigureSize, GeometryError, RectAnchor, SplitAxis};

    use crate::errors::EngineError;

    /// 名称仅使用单个大写字母 A..=Z。
    pub const MAX_NAMES: usize = 26;

    /// 可通过 [`RectSet::set_property`] 写入的属性。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Property {
        X,
        Y,
        W,
        H,
        Aspect,
        Selected,
    }

    impl FromStr for Property {
        type Err = EngineError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "x" => Ok(Property::X),
                "y" => Ok(Property::Y),
                "w" | "width" => Ok(Property::W),
                "h" | "height" => Ok(Property::H),
                "aspect" => Ok(Property::Aspect),
                "selected" => Ok(Property::Selected),
                _ => Err(EngineError::UnsupportedProperty(s.trim().to_string())),
            }
        }
    }

    impl fmt::Display for Property {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                Property::X => "x",
                Property::Y => "y",
                Property::W => "w",
                Property::H => "h",
                Property::Aspect => "aspect",
                Property::Selected => "selected",
            };
            f.write_str(name)
        }
    }

    /// 集合中的一个命名矩形。锚点由所属 [`RectSet`] 统一持有。
    #[derive(Debug, Clone, PartialEq)]
    pub struct RectEntry {
        name: String,
        bounds: Bounds,
        selected: bool,
        locked_aspect: bool,
    }

    impl RectEntry {
        #[inline]
        pub fn name(&self) -> &str {
            &self.name
        }

        #[inline]
        pub fn bounds(&self) -> Bounds {
            self.bounds
        }

        #[inline]
        pub fn is_selected(&self) -> bool {
            self.selected
        }

        #[inline]
        pub fn is_aspect_locked(&self) -> bool {
            self.locked_aspect
        }

        /// 以给定锚点生成几何视图。
        pub fn geometry(&self, anchor: Anchor) -> RectAnchor {
            RectAnchor::new(self.bounds, anchor).with_locked_aspect(self.locked_aspect)
        }
    }

    /// 有序命名矩形集合：共享图幅与锚点，维护选中状态并提供对齐、拆分、合并等复合操作。
    ///
    /// 复合操作以第一个选中项为参照，且先完成全部校验再统一写入，失败时集合保持不变。
    #[derive(Debug, Clone)]
    pub struct RectSet {
        figure: FigureSize,
        anchor: Anchor,
        entries: Vec<RectEntry>,
    }

    impl RectSet {
        pub fn new(figure: FigureSize, anchor: Anchor) -> Self {
            Self {
                figure,
                anchor,
                entries: Vec::new(),
            }
        }

        /// 由一组绝对边界初始化集合，名称按顺序分配。
        pub fn from_bounds(
            figure: FigureSize,
            bounds: impl IntoIterator<Item = Bounds>,
            anchor: Anchor,
        ) -> Result<Self, EngineError> {
            let mut set = Self::new(figure, anchor);
            for bnd in bounds {
                set.add(bnd)?;
            }
            Ok(set)
        }

        #[inline]
        pub fn figure(&self) -> FigureSize {
            self.figure
        }

        #[inline]
        pub fn set_figure(&mut self, figure: FigureSize) {
            self.figure = figure;
        }

        #[inline]
        pub fn anchor(&self) -> Anchor {
            self.anchor
        }

        /// 更换全局锚点，对所有矩形同时生效；边界不变。
        #[inline]
        pub fn set_anchor(&mut self, anchor: Anchor) {
            self.anchor = anchor;
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entries.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entries.is_empty()
        }

        #[inline]
        pub fn iter(&self) -> impl Iterator<Item = &RectEntry> + '_ {
            self.entries.iter()
        }

        pub fn names(&self) -> Vec<&str> {
            self.entries.iter().map(RectEntry::name).collect()
        }

        pub fn contains(&self, name: &str) -> bool {
            self.position(name).is_some()
        }

        pub fn entry(&self, name: &str) -> Option<&RectEntry> {
            self.entries.iter().find(|entry| entry.name == name)
        }

        /// 按集合顺序返回全部绝对边界。
        pub fn bounds_list(&self) -> Vec<Bounds> {
            self.entries.iter().map(RectEntry::bounds).collect()
        }

        /// 指定矩形在当前锚点下的几何视图。
        pub fn rect(&self, name: &str) -> Result<RectAnchor, EngineError> {
            self.entry(name)
                .map(|entry| entry.geometry(self.anchor))
                .ok_or_else(|| EngineError::RectNotFound(name.to_string()))
        }

        /// 扫描 A..=Z，返回第一个未被占用的名称。
        pub fn next_name(&self) -> Result<String, EngineError> {
            self.free_names(1)
                .pop()
                .ok_or(EngineError::NameCapacityExhausted(MAX_NAMES))
        }

        /// 以绝对边界新增矩形，返回分配的名称。
        pub fn add(&mut self, bounds: Bounds) -> Result<String, EngineError> {
            validate_extent(bounds.width(), bounds.height())?;
            let name = self.next_name()?;
            self.entries.push(RectEntry {
                name: name.clone(),
                bounds,
                selected: false,
                locked_aspect: false,
            });
            Ok(name)
        }

        /// 以锚点相对位置与尺寸新增矩形。
        pub fn add_at_position(
            &mut self,
            x: f64,
            y: f64,
            w: f64,
            h: f64,
        ) -> Result<String, EngineError> {
            let rect = RectAnchor::from_position(x, y, w, h, self.anchor);
            self.add(rect.bounds())
        }

        /// 按网格添加单元；`indices` 为空时添加全部单元。
        pub fn add_grid(
            &mut self,
            spec: &GridSpec,
            indices: &[usize],
        ) -> Result<Vec<String>, EngineError> {
            let cells = if indices.is_empty() {
                spec.cells()?
            } else {
                indices
                    .iter()
                    .map(|index| spec.cell(*index))
                    .collect::<Result<Vec<_>, _>>()?
            };
            self.ensure_capacity(cells.len())?;
            cells.into_iter().map(|cell| self.add(cell)).collect()
        }

        /// 移除并返回指定矩形。
        pub fn pop(&mut self, name: &str) -> Result<RectEntry, EngineError> {
            let index = self.index_of(name)?;
            Ok(self.entries.remove(index))
        }

        pub fn clear(&mut self) {
            self.entries.clear();
        }

        /// 通用属性写入；宽高必须为正数。
        pub fn set_property(
            &mut self,
            name: &str,
            property: Property,
            value: f64,
        ) -> Result<(), EngineError> {
            if property == Property::Selected {
                return self.select(name, value != 0.0);
            }
            if !value.is_finite() {
                return Err(GeometryError::GeometryConstraint(format!(
                    "{property} must be finite, got {value}"
                ))
                .into());
            }
            let figure = self.figure;
            self.update(name, |rect| match property {
                Property::X => {
                    rect.set_x(value);
                    Ok(())
                }
                Property::Y => {
                    rect.set_y(value);
                    Ok(())
                }
                Property::W => {
                    validate_extent(value, rect.h())?;
                    rect.set_w(value)
                }
                Property::H => {
                    validate_extent(rect.w(), value)?;
                    rect.set_h(value)
                }
                Property::Aspect => rect.set_aspect(figure, value),
                Property::Selected => Ok(()),
            })
        }

        pub fn set_lock_aspect(&mut self, name: &str, locked: bool) -> Result<(), EngineError> {
            let index = self.index_of(name)?;
            self.entries[index].locked_aspect = locked;
            Ok(())
        }

        pub fn select(&mut self, name: &str, selected: bool) -> Result<(), EngineError> {
            let index = self.index_of(name)?;
            self.entries[index].selected = selected;
            Ok(())
        }

        pub fn select_all(&mut self) {
            self.entries.iter_mut().for_each(|entry| entry.selected = true);
        }

        pub fn select_none(&mut self) {
            self.entries.iter_mut().for_each(|entry| entry.selected = false);
        }

        pub fn any_selected(&self) -> bool {
            self.entries.iter().any(RectEntry::is_selected)
        }

        /// 选中项，按集合顺序而非选中先后。
        pub fn selected(&self) -> Vec<&RectEntry> {
            self.entries.iter().filter(|entry| entry.selected).collect()
        }

        pub fn selected_names(&self) -> Vec<&str> {
            self.selected().into_iter().map(RectEntry::name).collect()
        }

        /// 按给定名称序列重排，序列必须恰为当前名称的一个排列。
        pub fn change_order<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), EngineError> {
            let requested: HashSet<&str> = names.iter().map(|name| name.as_ref()).collect();
            let current: HashSet<&str> = self.entries.iter().map(RectEntry::name).collect();
            if requested.len() != names.len()
                || requested.symmetric_difference(&current).next().is_some()
            {
                return Err(EngineError::PermutationMismatch);
            }

            let mut remaining = std::mem::take(&mut self.entries);
            for name in names {
                if let Some(index) = remaining.iter().position(|e| e.name == name.as_ref()) {
                    self.entries.push(remaining.swap_remove(index));
                }
            }
            Ok(())
        }

        /// 把 `rows` 指定的行整体移动到 `target` 之前，其余行保持相对顺序。
        ///
        /// 目标紧邻被移动的块时不做任何改动；行号越界返回 [`EngineError::RowOutOfRange`]。
        pub fn move_rows(&mut self, rows: &[usize], target: usize) -> Result<(), EngineError> {
            let len = self.entries.len();
            if let Some(&row) = rows.iter().find(|&&row| row >= len) {
                return Err(EngineError::RowOutOfRange { row, len });
            }
            if target > len {
                return Err(EngineError::RowOutOfRange { row: target, len });
            }
            if rows.contains(&target) || (target > 0 && rows.contains(&(target - 1))) {
                return Ok(());
            }
            let mut order: Vec<usize> = (0..self.entries.len()).collect();
            order.sort_by_key(|index| {
                if rows.contains(index) {
                    1
                } else if *index < target {
                    0
                } else {
                    2
                }
            });
            let names: Vec<String> = order
                .into_iter()
                .map(|index| self.entries[index].name.clone())
                .collect();
            self.change_order(&names)
        }

        /// 所有选中项的 x 对齐到第一个选中项。返回被修改的数量。
        pub fn align_x(&mut self) -> Result<usize, EngineError> {
            self.apply_to_selection(|reference, rect| {
                rect.set_x(reference.x());
                Ok(())
            })
        }

        pub fn align_y(&mut self) -> Result<usize, EngineError> {
            self.apply_to_selection(|reference, rect| {
                rect.set_y(reference.y());
                Ok(())
            })
        }

        pub fn equal_width(&mut self) -> Result<usize, EngineError> {
            self.apply_to_selection(|reference, rect| rect.set_w(reference.w()))
        }

        pub fn equal_height(&mut self) -> Result<usize, EngineError> {
            self.apply_to_selection(|reference, rect| rect.set_h(reference.h()))
        }

        pub fn equal_aspect(&mut self) -> Result<usize, EngineError> {
            let figure = self.figure;
            self.apply_to_selection(|reference, rect| {
                rect.set_aspect(figure, reference.aspect(figure)?)
            })
        }

        /// 以选中项的并集包围盒替换第一个选中项，并删除其余选中项。
        ///
        /// 包围盒在绝对坐标下计算，与当前锚点无关。返回保留下来的名称。
        pub fn join(&mut self) -> Option<String> {
            let selected = self.selected_indices();
            let (&first, rest) = selected.split_first()?;
            let joined = rest.iter().fold(self.entries[first].bounds, |acc, index| {
                acc.union(&self.entries[*index].bounds)
            });
            self.entries[first].bounds = joined;
            let keep = self.entries[first].name.clone();
            self.entries
                .retain(|entry| !entry.selected || entry.name == keep);
            Some(keep)
        }

        /// 拆分每个选中项，新矩形追加到末尾并继承选中与锁定状态。
        pub fn split(
            &mut self,
            ratio: f64,
            spacing: f64,
            axis: SplitAxis,
        ) -> Result<Vec<String>, EngineError> {
            let plans = self
                .selected_indices()
                .into_iter()
                .map(|index| {
                    let (first, second) = self.entries[index].bounds.split(ratio, spacing, axis)?;
                    validate_extent(first.width(), first.height())?;
                    validate_extent(second.width(), second.height())?;
                    Ok::<_, GeometryError>((index, (first, second)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let names = self.free_names(plans.len());
            if names.len() < plans.len() {
                return Err(EngineError::NameCapacityExhausted(MAX_NAMES));
            }

            for ((index, (first, second)), name) in plans.into_iter().zip(names.iter()) {
                let source = &mut self.entries[index];
                source.bounds = first;
                let entry = RectEntry {
                    name: name.clone(),
                    bounds: second,
                    selected: source.selected,
                    locked_aspect: source.locked_aspect,
                };
                self.entries.push(entry);
            }
            Ok(names)
        }

        /// 删除全部选中项，返回被删除的名称。
        pub fn delete_selected(&mut self) -> Vec<String> {
            let (removed, kept): (Vec<RectEntry>, Vec<RectEntry>) =
                std::mem::take(&mut self.entries)
                    .into_iter()
                    .partition(RectEntry::is_selected);
            self.entries = kept;
            removed.into_iter().map(|entry| entry.name).collect()
        }

        fn position(&self, name: &str) -> Option<usize> {
            self.entries.iter().position(|entry| entry.name == name)
        }

        fn index_of(&self, name: &str) -> Result<usize, EngineError> {
            self.position(name)
                .ok_or_else(|| EngineError::RectNotFound(name.to_string()))
        }

        fn selected_indices(&self) -> Vec<usize> {
            self.entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.selected)
                .map(|(index, _)| index)
                .collect()
        }

        /// 按字母顺序返回至多 `count` 个空闲名称。
        fn free_names(&self, count: usize) -> Vec<String> {
            ('A'..='Z')
                .map(String::from)
                .filter(|name| !self.contains(name))
                .take(count)
                .collect()
        }

        fn ensure_capacity(&self, additional: usize) -> Result<(), EngineError> {
            if self.entries.len() + additional > MAX_NAMES {
                return Err(EngineError::NameCapacityExhausted(MAX_NAMES));
            }
            Ok(())
        }

        fn update<F>(&mut self, name: &str, mutate: F) -> Result<(), EngineError>
        where
            F: FnOnce(&mut RectAnchor) -> Result<(), GeometryError>,
        {
            let index = self.index_of(name)?;
            let mut rect = self.entries[index].geometry(self.anchor);
            mutate(&mut rect)?;
            self.entries[index].bounds = rect.bounds();
            Ok(())
        }

        /// 以第一个选中项为参照，对其余选中项计算新边界后统一写入。
        fn apply_to_selection<F>(&mut self, mut mutate: F) -> Result<usize, EngineError>
        where
            F: FnMut(&RectAnchor, &mut RectAnchor) -> Result<(), GeometryError>,
        {
            let selected = self.selected_indices();
            let Some((&first, rest)) = selected.split_first() else {
                return Ok(0);
            };
            let reference = self.entries[first].geometry(self.anchor);
            let updates = rest
                .iter()
                .map(|index| {
                    let mut rect = self.entries[*index].geometry(self.anchor);
                    mutate(&reference, &mut rect).map(|_| (*index, rect.bounds()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let count = updates.len();
            for (index, bounds) in updates {
                self.entries[index].bounds = bounds;
            }
            Ok(count)
        }
    }

    fn validate_extent(width: f64, height: f64) -> Result<(), GeometryError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(GeometryError::GeometryConstraint(format!(
                "width and height must be positive, got {width} x {height}"
            )));
        }
        Ok(())
    }

}
