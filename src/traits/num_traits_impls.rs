use num_traits::{One, Zero};

use crate::float::Float;
use crate::real::Real;
use crate::scalar::{ConstScalar, Scalar};

// ══════════════════════════════════════════════
//  Real<F>
// ══════════════════════════════════════════════

impl<F: Float> Zero for Real<F> {
    #[inline]
    fn zero() -> Self {
        Real::null()
    }

    /// Zero value; derivatives are not inspected.
    #[inline]
    fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    #[inline]
    fn set_zero(&mut self) {
        self.reset();
    }
}

impl<F: Float> One for Real<F> {
    #[inline]
    fn one() -> Self {
        Real::new(F::one())
    }
}
