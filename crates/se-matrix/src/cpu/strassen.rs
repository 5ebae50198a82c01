use tracing::trace;

use super::classical::multiply_accumulate;
use super::combine::{combine, Sign};
use crate::alloc::ScratchSet;
use crate::view::{MatView, MatViewMut, Quadrant};

/// Recursive Strassen multiply of square power-of-two blocks.
///
/// At or below `leaf_size` this is the classical `C += A × B`, so `c` must be
/// zeroed by the caller. Above it, every quadrant of `c` is overwritten.
///
/// Each level computes the seven sub-products as independent rayon tasks and
/// waits for all of them before combining. Must be called from inside the
/// thread pool that should run the recursion.
///
/// # Panics
/// Panics if the views differ in size, or if a block above `leaf_size` is
/// not a power of two.
pub fn strassen(a: MatView<'_>, b: MatView<'_>, mut c: MatViewMut<'_>, leaf_size: usize) {
    let r = c.size();
    assert_eq!(a.size(), r, "strassen: A is {}x{}, C is {}x{}", a.size(), a.size(), r, r);
    assert_eq!(b.size(), r, "strassen: B is {}x{}, C is {}x{}", b.size(), b.size(), r, r);

    if r <= leaf_size {
        multiply_accumulate(a, b, c);
        return;
    }

    assert!(r.is_power_of_two(), "strassen: block size {} is not a power of two", r);
    let h = r / 2;
    trace!(size = r, half = h, "strassen split");

    let [a11, a12, a21, a22] = a.quadrants();
    let [b11, b12, b21, b22] = b.quadrants();

    // Children at or below the leaf accumulate into their product buffer.
    let mut scratch = ScratchSet::acquire(h, h <= leaf_size);
    let (s, p) = scratch.split_mut();
    let [s1, s2, s3, s4, s5, s6, s7, s8, s9, s10] = s;
    let [p1, p2, p3, p4, p5, p6, p7] = p;

    combine(b12, b22, MatViewMut::compact(s1, h), Sign::Minus);
    combine(a11, a12, MatViewMut::compact(s2, h), Sign::Plus);
    combine(a21, a22, MatViewMut::compact(s3, h), Sign::Plus);
    combine(b21, b11, MatViewMut::compact(s4, h), Sign::Minus);
    combine(a11, a22, MatViewMut::compact(s5, h), Sign::Plus);
    combine(b11, b22, MatViewMut::compact(s6, h), Sign::Plus);
    combine(a12, a22, MatViewMut::compact(s7, h), Sign::Minus);
    combine(b21, b22, MatViewMut::compact(s8, h), Sign::Plus);
    combine(a11, a21, MatViewMut::compact(s9, h), Sign::Minus);
    combine(b11, b12, MatViewMut::compact(s10, h), Sign::Plus);

    {
        let tasks = [
            (a11, compact(s1, h), MatViewMut::compact(p1, h)),
            (compact(s2, h), b22, MatViewMut::compact(p2, h)),
            (compact(s3, h), b11, MatViewMut::compact(p3, h)),
            (a22, compact(s4, h), MatViewMut::compact(p4, h)),
            (compact(s5, h), compact(s6, h), MatViewMut::compact(p5, h)),
            (compact(s7, h), compact(s8, h), MatViewMut::compact(p6, h)),
            (compact(s9, h), compact(s10, h), MatViewMut::compact(p7, h)),
        ];

        // The scope returns only once all seven products are done.
        rayon::scope(|scope| {
            for (x, y, out) in tasks {
                scope.spawn(move |_| strassen(x, y, out, leaf_size));
            }
        });
    }

    // C11 = P5 + P4 - P2 + P6
    combine(compact(p5, h), compact(p4, h), MatViewMut::compact(s1, h), Sign::Plus);
    combine(compact(s1, h), compact(p2, h), MatViewMut::compact(s2, h), Sign::Minus);
    combine(compact(s2, h), compact(p6, h), c.quadrant_mut(Quadrant::TopLeft), Sign::Plus);
    // C12 = P1 + P2
    combine(compact(p1, h), compact(p2, h), c.quadrant_mut(Quadrant::TopRight), Sign::Plus);
    // C21 = P3 + P4
    combine(compact(p3, h), compact(p4, h), c.quadrant_mut(Quadrant::BottomLeft), Sign::Plus);
    // C22 = P5 + P1 - P3 - P7
    combine(compact(p5, h), compact(p1, h), MatViewMut::compact(s1, h), Sign::Plus);
    combine(compact(s1, h), compact(p3, h), MatViewMut::compact(s2, h), Sign::Minus);
    combine(compact(s2, h), compact(p7, h), c.quadrant_mut(Quadrant::BottomRight), Sign::Minus);
}

fn compact(buf: &[f64], size: usize) -> MatView<'_> {
    MatView::compact(buf, size)
}
