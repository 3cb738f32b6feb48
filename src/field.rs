//! Parity-typed lattice field containers.
//!
//! A staggered fermion field assigns a small complex color vector to every
//! lattice site. The sites split into two checkerboard ("parity") classes,
//! and most of the low-mode machinery works on fields restricted to a single
//! class. Mixing a full-lattice field with a parity-restricted one is the
//! classic silent-corruption bug in this kind of code, so the two flavors are
//! distinct types here: [`FullVector`] and [`HalfVector`], related by exactly
//! one conversion pair, [`FullVector::restrict`] and [`FullVector::merge`].
//!
//! Which of the two parity classes a `HalfVector` lives on remains a runtime
//! tag ([`Parity`]): eigenvector parity is data read from an eigenpack, not
//! something known at compile time. Agreement of tags between operands is a
//! debug-time assertion only; release builds trust the caller.
//!
//! Storage delegates to [`faer`] dense columns (`Mat<c64>`), which supplies
//! the optimized arithmetic kernels. A full-lattice field stores the
//! even-parity sites in the leading half of the column and the odd-parity
//! sites in the trailing half.

use faer::{c64, prelude::*};

/// Conjugate-linear dot product of two columns.
fn dot(a: MatRef<'_, c64>, b: MatRef<'_, c64>) -> c64 {
    debug_assert_eq!(a.nrows(), b.nrows());
    let mut acc = c64::new(0.0, 0.0);
    for i in 0..a.nrows() {
        acc += a[(i, 0)].conj() * b[(i, 0)];
    }
    acc
}

/// One of the two checkerboard classes partitioning the lattice sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Returns the complementary parity class.
    pub fn flip(self) -> Parity {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

/// A complex color-vector field restricted to the sites of one parity class.
#[derive(Debug, Clone)]
pub struct HalfVector {
    data: Mat<c64>,
    parity: Parity,
}

impl HalfVector {
    /// Creates a zero field of `dim` complex components on the given parity.
    pub fn zeros(dim: usize, parity: Parity) -> Self {
        Self {
            data: Mat::zeros(dim, 1),
            parity,
        }
    }

    /// Wraps an existing single-column matrix as a parity-restricted field.
    ///
    /// # Panics
    /// Panics if `data` is not a single column.
    pub fn from_mat(data: Mat<c64>, parity: Parity) -> Self {
        assert_eq!(data.ncols(), 1, "a lattice field is a single column");
        Self { data, parity }
    }

    /// Number of complex components (sites times colors) on this parity.
    pub fn dim(&self) -> usize {
        self.data.nrows()
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Overwrites the parity tag without touching the data.
    ///
    /// This is the only sanctioned way to re-declare which checkerboard a
    /// field lives on; it requires exclusive access, so no other holder can
    /// observe the change.
    pub fn retag(&mut self, parity: Parity) {
        self.parity = parity;
    }

    /// Read-only view of the underlying column.
    pub fn as_mat(&self) -> MatRef<'_, c64> {
        self.data.as_ref()
    }

    /// Copies `src` into `self`, data and parity tag both.
    pub fn copy_from(&mut self, src: &HalfVector) {
        self.data.as_mut().copy_from(src.data.as_ref());
        self.parity = src.parity;
    }

    /// Copies a raw column into `self`, keeping the current parity tag.
    pub fn copy_from_mat(&mut self, src: MatRef<'_, c64>) {
        self.data.as_mut().copy_from(src);
    }

    /// Sets every component to zero.
    pub fn fill_zero(&mut self) {
        self.data = Mat::zeros(self.data.nrows(), 1);
    }

    /// Inner product `<self, other>`, conjugate-linear in `self`.
    ///
    /// On the distributed runtime this is a collective reduction; here it is
    /// a dense dot product.
    pub fn inner(&self, other: &HalfVector) -> c64 {
        debug_assert_eq!(self.parity, other.parity, "inner product across parities");
        dot(self.data.as_ref(), other.data.as_ref())
    }

    /// The L2 norm of the field.
    pub fn norm_l2(&self) -> f64 {
        self.data.norm_l2()
    }

    /// In-place scaling `self <- a * self`.
    pub fn scale(&mut self, a: c64) {
        self.data = &self.data * Scale(a);
    }

    /// Accumulates `self <- self + a * x`.
    pub fn axpy(&mut self, a: c64, x: &HalfVector) {
        debug_assert_eq!(self.parity, x.parity, "axpy across parities");
        self.data = &self.data + &(&x.data * Scale(a));
    }
}

/// A complex color-vector field over the whole lattice, both parity classes.
#[derive(Debug, Clone)]
pub struct FullVector {
    data: Mat<c64>,
}

impl FullVector {
    /// Creates a zero full-lattice field of `dim` complex components.
    ///
    /// # Panics
    /// Panics if `dim` is odd; the two checkerboards have equal site counts.
    pub fn zeros(dim: usize) -> Self {
        assert_eq!(dim % 2, 0, "a full lattice splits into two equal halves");
        Self {
            data: Mat::zeros(dim, 1),
        }
    }

    /// Wraps an existing single-column matrix as a full-lattice field.
    ///
    /// # Panics
    /// Panics if `data` is not a single column of even length.
    pub fn from_mat(data: Mat<c64>) -> Self {
        assert_eq!(data.ncols(), 1, "a lattice field is a single column");
        assert_eq!(data.nrows() % 2, 0, "a full lattice splits into two equal halves");
        Self { data }
    }

    pub fn dim(&self) -> usize {
        self.data.nrows()
    }

    /// Number of complex components on each parity class.
    pub fn half_dim(&self) -> usize {
        self.data.nrows() / 2
    }

    pub fn as_mat(&self) -> MatRef<'_, c64> {
        self.data.as_ref()
    }

    /// Read-only view of one parity's block of the column.
    pub fn half(&self, parity: Parity) -> MatRef<'_, c64> {
        let h = self.half_dim();
        match parity {
            Parity::Even => self.data.as_ref().subrows(0, h),
            Parity::Odd => self.data.as_ref().subrows(h, h),
        }
    }

    /// Extracts the component on one parity class (checkerboard pick).
    pub fn restrict(&self, parity: Parity) -> HalfVector {
        HalfVector {
            data: self.half(parity).to_owned(),
            parity,
        }
    }

    /// Writes a parity-restricted field back into its checkerboard
    /// (checkerboard set). Exact inverse of [`FullVector::restrict`] for the
    /// same parity; the complementary checkerboard is untouched.
    pub fn merge(&mut self, half: &HalfVector) {
        let h = self.half_dim();
        debug_assert_eq!(half.dim(), h, "merging a half of the wrong dimension");
        let offset = match half.parity {
            Parity::Even => 0,
            Parity::Odd => h,
        };
        self.data
            .as_mut()
            .subrows_mut(offset, h)
            .copy_from(half.data.as_ref());
    }

    /// Copies `src` into `self`.
    pub fn copy_from(&mut self, src: &FullVector) {
        self.data.as_mut().copy_from(src.data.as_ref());
    }

    /// Copies a raw column into `self`.
    pub fn copy_from_mat(&mut self, src: MatRef<'_, c64>) {
        self.data.as_mut().copy_from(src);
    }

    pub fn fill_zero(&mut self) {
        self.data = Mat::zeros(self.data.nrows(), 1);
    }

    /// Inner product `<self, other>`, conjugate-linear in `self`.
    pub fn inner(&self, other: &FullVector) -> c64 {
        dot(self.data.as_ref(), other.data.as_ref())
    }

    pub fn norm_l2(&self) -> f64 {
        self.data.norm_l2()
    }

    /// In-place scaling `self <- a * self`.
    pub fn scale(&mut self, a: c64) {
        self.data = &self.data * Scale(a);
    }

    /// Accumulates `self <- self + a * x`.
    pub fn axpy(&mut self, a: c64, x: &FullVector) {
        self.data = &self.data + &(&x.data * Scale(a));
    }

    /// Replaces `self` with `source - self`.
    pub fn subtract_from(&mut self, source: &FullVector) {
        self.data = &source.data - &self.data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dim: usize) -> FullVector {
        FullVector::from_mat(Mat::from_fn(dim, 1, |i, _| c64::new(i as f64, -(i as f64))))
    }

    #[test]
    fn test_restrict_merge_roundtrip() {
        let full = ramp(8);
        let even = full.restrict(Parity::Even);
        let odd = full.restrict(Parity::Odd);
        assert_eq!(even.parity(), Parity::Even);
        assert_eq!(odd.parity(), Parity::Odd);
        assert_eq!(even.dim(), 4);

        let mut rebuilt = FullVector::zeros(8);
        rebuilt.merge(&even);
        rebuilt.merge(&odd);
        let diff = (rebuilt.as_mat() - full.as_mat()).norm_l2();
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn test_parity_flip() {
        assert_eq!(Parity::Even.flip(), Parity::Odd);
        assert_eq!(Parity::Odd.flip(), Parity::Even);
    }

    #[test]
    fn test_inner_is_conjugate_linear_on_the_left() {
        let mut a = HalfVector::zeros(2, Parity::Even);
        let mut b = HalfVector::zeros(2, Parity::Even);
        a.copy_from_mat(Mat::from_fn(2, 1, |i, _| c64::new(0.0, (i + 1) as f64)).as_ref());
        b.copy_from_mat(Mat::from_fn(2, 1, |i, _| c64::new((i + 1) as f64, 0.0)).as_ref());

        // <a, b> = sum conj(a_i) b_i = conj(i)*1 + conj(2i)*2 = -5i.
        let ip = a.inner(&b);
        assert!((ip - c64::new(0.0, -5.0)).norm() < 1e-15);
    }

    #[test]
    fn test_axpy_and_scale() {
        let mut x = HalfVector::zeros(3, Parity::Odd);
        let mut y = HalfVector::zeros(3, Parity::Odd);
        x.copy_from_mat(Mat::from_fn(3, 1, |i, _| c64::new(1.0 + i as f64, 0.0)).as_ref());
        y.copy_from_mat(Mat::from_fn(3, 1, |_, _| c64::new(1.0, 1.0)).as_ref());

        y.axpy(c64::new(2.0, 0.0), &x);
        // y_0 = (1 + i) + 2*1 = 3 + i
        assert!((y.as_mat()[(0, 0)] - c64::new(3.0, 1.0)).norm() < 1e-15);

        y.scale(c64::new(0.0, 1.0));
        // i * (3 + i) = -1 + 3i
        assert!((y.as_mat()[(0, 0)] - c64::new(-1.0, 3.0)).norm() < 1e-15);
    }

    #[test]
    fn test_subtract_from() {
        let src = ramp(4);
        let mut sol = ramp(4);
        sol.scale(c64::new(0.25, 0.0));
        sol.subtract_from(&src);
        // src - 0.25 src = 0.75 src
        let expected = 0.75 * src.norm_l2();
        assert!((sol.norm_l2() - expected).abs() < 1e-12);
    }
}
