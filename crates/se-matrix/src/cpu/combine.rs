use rayon::prelude::*;

use crate::view::{MatView, MatViewMut};

/// Sign applied to the second operand of [`combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// Elementwise `C = A + B` or `C = A - B` over a square block.
///
/// Output rows are written in parallel; every element depends only on the
/// matching elements of `a` and `b`.
///
/// # Panics
/// Panics if the three views differ in size.
pub fn combine(a: MatView<'_>, b: MatView<'_>, c: MatViewMut<'_>, sign: Sign) {
    let r = c.size();
    assert_eq!(a.size(), r, "combine: A is {}x{}, C is {}x{}", a.size(), a.size(), r, r);
    assert_eq!(b.size(), r, "combine: B is {}x{}, C is {}x{}", b.size(), b.size(), r, r);

    c.into_par_rows().enumerate().for_each(|(i, c_row)| {
        let rows = c_row.iter_mut().zip(a.row(i)).zip(b.row(i));
        match sign {
            Sign::Plus => rows.for_each(|((c, &x), &y)| *c = x + y),
            Sign::Minus => rows.for_each(|((c, &x), &y)| *c = x - y),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Quadrant;

    #[test]
    fn test_add() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![10.0, 20.0, 30.0, 40.0];
        let mut c = vec![0.0; 4];
        combine(
            MatView::compact(&a, 2),
            MatView::compact(&b, 2),
            MatViewMut::compact(&mut c, 2),
            Sign::Plus,
        );
        assert_eq!(c, vec![11.0, 22.0, 33.0, 44.0]);
    }

    #[test]
    fn test_sub_overwrites() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![1.0, 1.0, 1.0, 1.0];
        let mut c = vec![99.0; 4];
        combine(
            MatView::compact(&a, 2),
            MatView::compact(&b, 2),
            MatViewMut::compact(&mut c, 2),
            Sign::Minus,
        );
        assert_eq!(c, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_strided_operands_into_quadrant() {
        // A = top-left and B = bottom-right of a 4x4 buffer; C = top-right of another.
        let src: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let parent = MatView::compact(&src, 4);
        let mut dst = vec![0.0; 16];
        {
            let mut out = MatViewMut::compact(&mut dst, 4);
            combine(
                parent.quadrant(Quadrant::TopLeft),
                parent.quadrant(Quadrant::BottomRight),
                out.quadrant_mut(Quadrant::TopRight),
                Sign::Plus,
            );
        }
        // [0,1;4,5] + [10,11;14,15]
        assert_eq!(&dst[2..4], &[10.0, 12.0]);
        assert_eq!(&dst[6..8], &[18.0, 20.0]);
        assert!(dst[..2].iter().chain(&dst[8..]).all(|&x| x == 0.0));
    }

    #[test]
    #[should_panic]
    fn test_size_mismatch_panics() {
        let a = vec![0.0; 4];
        let b = vec![0.0; 9];
        let mut c = vec![0.0; 4];
        combine(
            MatView::compact(&a, 2),
            MatView::compact(&b, 3),
            MatViewMut::compact(&mut c, 2),
            Sign::Plus,
        );
    }
}
