use rayon::prelude::*;

use crate::view::{MatView, MatViewMut};

/// Classical `C += A × B` over square blocks.
///
/// Loop order is i, k, j: the inner sweep walks a full row of B and the
/// matching row of C with unit stride. Work is partitioned by output row,
/// so every row of C has exactly one writer.
///
/// `c` is accumulated into, never cleared.
///
/// # Panics
/// Panics if the three views differ in size.
pub fn multiply_accumulate(a: MatView<'_>, b: MatView<'_>, c: MatViewMut<'_>) {
    let r = c.size();
    assert_eq!(a.size(), r, "multiply_accumulate: A is {}x{}, C is {}x{}", a.size(), a.size(), r, r);
    assert_eq!(b.size(), r, "multiply_accumulate: B is {}x{}, C is {}x{}", b.size(), b.size(), r, r);

    c.into_par_rows().enumerate().for_each(|(i, c_row)| {
        for (k, &aik) in a.row(i).iter().enumerate() {
            for (cij, &bkj) in c_row.iter_mut().zip(b.row(k)) {
                *cij += aik * bkj;
            }
        }
    });
}
