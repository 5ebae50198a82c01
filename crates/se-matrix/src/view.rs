use rayon::prelude::*;

/// One of the four equal sub-blocks of a square block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// (block row, block column) of this quadrant.
    fn coords(self) -> (usize, usize) {
        match self {
            Quadrant::TopLeft => (0, 0),
            Quadrant::TopRight => (0, 1),
            Quadrant::BottomLeft => (1, 0),
            Quadrant::BottomRight => (1, 1),
        }
    }

    /// Element offset of this quadrant inside a `size×size` block with the
    /// given row stride.
    pub fn offset(self, size: usize, stride: usize) -> usize {
        let h = size / 2;
        let (qi, qj) = self.coords();
        qi * h * stride + qj * h
    }
}

/// Number of elements a `size×size` block with row stride `stride` spans,
/// from its first element to its last.
fn extent(stride: usize, size: usize) -> usize {
    if size == 0 {
        0
    } else {
        (size - 1) * stride + size
    }
}

fn check_layout(len: usize, stride: usize, size: usize) -> usize {
    assert!(
        size <= stride || size == 0,
        "block size {} exceeds row stride {}",
        size,
        stride
    );
    let needed = extent(stride, size);
    assert!(
        len >= needed,
        "slice of {} elements cannot hold a {}x{} block with stride {} ({} needed)",
        len,
        size,
        size,
        stride,
        needed
    );
    needed
}

/// Read-only view of a square block inside a row-major buffer.
///
/// The view starts at the block's first element and keeps the row stride
/// of the buffer it was cut from, so quadrants of quadrants still address
/// the parent buffer.
#[derive(Debug, Clone, Copy)]
pub struct MatView<'a> {
    data: &'a [f64],
    stride: usize,
    size: usize,
}

impl<'a> MatView<'a> {
    /// Create a view of the `size×size` block starting at `data[0]`.
    ///
    /// # Panics
    /// Panics if `size > stride` or `data` is too short for the block.
    pub fn new(data: &'a [f64], stride: usize, size: usize) -> Self {
        let len = check_layout(data.len(), stride, size);
        MatView {
            data: &data[..len],
            stride,
            size,
        }
    }

    /// View of a compact `size×size` buffer (stride == size).
    pub fn compact(data: &'a [f64], size: usize) -> Self {
        Self::new(data, size, size)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Row `i` of the block, `size` elements long.
    pub fn row(&self, i: usize) -> &'a [f64] {
        let start = i * self.stride;
        &self.data[start..start + self.size]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.row(i)[j]
    }

    /// Sub-block view of one quadrant. The stride is inherited unchanged.
    pub fn quadrant(&self, q: Quadrant) -> MatView<'a> {
        debug_assert!(self.size % 2 == 0, "odd block size {}", self.size);
        let offset = q.offset(self.size, self.stride);
        MatView::new(&self.data[offset..], self.stride, self.size / 2)
    }

    /// All four quadrants in (top-left, top-right, bottom-left, bottom-right) order.
    pub fn quadrants(&self) -> [MatView<'a>; 4] {
        [
            self.quadrant(Quadrant::TopLeft),
            self.quadrant(Quadrant::TopRight),
            self.quadrant(Quadrant::BottomLeft),
            self.quadrant(Quadrant::BottomRight),
        ]
    }
}

/// Exclusive view of a square block inside a row-major buffer.
///
/// Quadrants of a mutable view overlap in the underlying slice, so only one
/// of them can be borrowed at a time. Row-parallel writers go through
/// [`MatViewMut::into_par_rows`].
#[derive(Debug)]
pub struct MatViewMut<'a> {
    data: &'a mut [f64],
    stride: usize,
    size: usize,
}

impl<'a> MatViewMut<'a> {
    /// # Panics
    /// Panics if `size > stride` or `data` is too short for the block.
    pub fn new(data: &'a mut [f64], stride: usize, size: usize) -> Self {
        let len = check_layout(data.len(), stride, size);
        MatViewMut {
            data: &mut data[..len],
            stride,
            size,
        }
    }

    pub fn compact(data: &'a mut [f64], size: usize) -> Self {
        Self::new(data, size, size)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Shorter-lived mutable view of the same block.
    pub fn reborrow(&mut self) -> MatViewMut<'_> {
        MatViewMut {
            data: &mut *self.data,
            stride: self.stride,
            size: self.size,
        }
    }

    pub fn as_view(&self) -> MatView<'_> {
        MatView {
            data: &*self.data,
            stride: self.stride,
            size: self.size,
        }
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.stride;
        &mut self.data[start..start + self.size]
    }

    /// Mutable sub-block view of one quadrant, borrowing `self`.
    pub fn quadrant_mut(&mut self, q: Quadrant) -> MatViewMut<'_> {
        debug_assert!(self.size % 2 == 0, "odd block size {}", self.size);
        let offset = q.offset(self.size, self.stride);
        MatViewMut::new(&mut self.data[offset..], self.stride, self.size / 2)
    }

    /// Splits the block into its `size` disjoint rows for parallel writers.
    pub fn into_par_rows(self) -> impl IndexedParallelIterator<Item = &'a mut [f64]> {
        let MatViewMut { data, stride, size } = self;
        // Every chunk but the last is `stride` long; the last is exactly `size`.
        data.par_chunks_mut(stride.max(1))
            .map(move |chunk| &mut chunk[..size])
    }
}
