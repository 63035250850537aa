use super::ScanSlice;
use crate::CtVolume;

/// 按切片索引升序迭代 `(索引, 切片)` 的迭代器.
///
/// 虽然 `volume.data().axis_iter(Axis(0)).enumerate()` 也能实现相同的功能,
/// 但手写的迭代器可以直接 `Clone`, 从任意位置重新开始, 且携带索引的切片更不容易错位.
#[derive(Clone, Debug)]
pub struct SliceIter<'a> {
    volume: &'a CtVolume,
    cur: usize,
    end: usize,
}

impl<'a> SliceIter<'a> {
    #[inline]
    pub(crate) fn new(volume: &'a CtVolume) -> Self {
        Self {
            volume,
            cur: 0,
            end: volume.len_z(),
        }
    }
}

impl<'a> Iterator for SliceIter<'a> {
    type Item = (usize, ScanSlice<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.end {
            return None;
        }
        let index = self.cur;
        self.cur += 1;
        Some((index, self.volume.slice_at(index)))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.cur;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for SliceIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.cur == self.end {
            return None;
        }
        self.end -= 1;
        Some((self.end, self.volume.slice_at(self.end)))
    }
}

impl ExactSizeIterator for SliceIter<'_> {}
