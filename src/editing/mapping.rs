//! Position mapping through recorded steps

/// Position change caused by a single step: `old_size` positions starting at
/// `start` were replaced by `new_size` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            start,
            old_size,
            new_size,
        }
    }

    /// Map a position. `assoc` picks the side a position touching an insertion
    /// sticks to: negative keeps it before, positive moves it after.
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        let end = self.start + self.old_size;
        if pos < self.start {
            return pos;
        }
        if pos > end {
            return pos - self.old_size + self.new_size;
        }
        let side = if self.old_size == 0 {
            assoc
        } else if pos == self.start {
            -1
        } else if pos == end {
            1
        } else {
            assoc
        };
        if side < 0 {
            self.start
        } else {
            self.start + self.new_size
        }
    }
}

/// Ordered list of step maps
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    /// Map through every recorded step, sticking to the right
    pub fn map(&self, pos: usize) -> usize {
        self.map_from(0, pos)
    }

    /// Map through the steps recorded at or after index `from`
    pub fn map_from(&self, from: usize, pos: usize) -> usize {
        self.maps
            .iter()
            .skip(from)
            .fold(pos, |pos, map| map.map(pos, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_map() {
        let map = StepMap::new(10, 0, 4);
        assert_eq!(map.map(5, 1), 5);
        assert_eq!(map.map(10, 1), 14);
        assert_eq!(map.map(10, -1), 10);
        assert_eq!(map.map(12, 1), 16);
    }

    #[test]
    fn test_deletion_map() {
        let map = StepMap::new(10, 4, 0);
        assert_eq!(map.map(10, 1), 10);
        assert_eq!(map.map(12, 1), 10);
        assert_eq!(map.map(14, 1), 10);
        assert_eq!(map.map(20, 1), 16);
    }

    #[test]
    fn test_map_from_skips_earlier_steps() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(0, 0, 2));
        mapping.push(StepMap::new(5, 0, 3));
        assert_eq!(mapping.map(6), 11);
        assert_eq!(mapping.map_from(1, 6), 9);
        assert_eq!(mapping.map_from(2, 6), 6);
    }
}
