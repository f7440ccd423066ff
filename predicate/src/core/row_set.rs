//! Row-set abstractions built on top of roaring bitmaps.

use std::convert::TryFrom;

use roaring::RoaringBitmap;

/// Raw identifier of a row within one table.
pub type RowId = u32;

/// Borrowed iterator that yields [`RowId`] values in ascending order.
pub type RowIdIter<'a> = Box<dyn Iterator<Item = RowId> + Send + 'a>;

/// Abstract set of row identifiers that supports basic set algebra.
pub trait RowSet: Send + Sync {
    /// Returns the number of rows tracked by the set.
    fn len(&self) -> usize;

    /// Returns true when the set is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over row identifiers.
    fn iter(&self) -> RowIdIter<'_>;

    /// Returns the intersection between this set and `other`.
    fn intersect(&self, other: &Self) -> Self
    where
        Self: Sized;

    /// Returns the union between this set and `other`.
    fn union(&self, other: &Self) -> Self
    where
        Self: Sized;

    /// Returns the relative complement (`self \ other`).
    fn difference(&self, other: &Self) -> Self
    where
        Self: Sized;
}

/// [`RowSet`] implementation backed by a roaring bitmap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitmapRowSet {
    bitmap: RoaringBitmap,
}

impl BitmapRowSet {
    /// Creates an empty bitmap-backed row set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FromIterator<RowId> for BitmapRowSet {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            bitmap: iter.into_iter().collect(),
        }
    }
}

impl RowSet for BitmapRowSet {
    fn len(&self) -> usize {
        usize::try_from(self.bitmap.len()).unwrap_or(usize::MAX)
    }

    fn iter(&self) -> RowIdIter<'_> {
        Box::new(self.bitmap.iter())
    }

    fn intersect(&self, other: &Self) -> Self {
        let bitmap = &self.bitmap & &other.bitmap;
        Self { bitmap }
    }

    fn union(&self, other: &Self) -> Self {
        let bitmap = &self.bitmap | &other.bitmap;
        Self { bitmap }
    }

    fn difference(&self, other: &Self) -> Self {
        let bitmap = &self.bitmap - &other.bitmap;
        Self { bitmap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_algebra() {
        let left: BitmapRowSet = [1, 2, 3].into_iter().collect();
        let right: BitmapRowSet = [2, 3, 4].into_iter().collect();
        assert_eq!(left.intersect(&right).iter().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(left.union(&right).len(), 4);
        assert_eq!(left.difference(&right).iter().collect::<Vec<_>>(), vec![1]);
        assert!(BitmapRowSet::new().is_empty());
    }
}
