use crate::{common::*, Point, HW};

/// Axis-aligned scaling followed by translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScaleTransform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> ScaleTransform<T>
where
    T: Copy + Num,
{
    /// Maps the unit square onto an image of `size`.
    pub fn from_unit_to(size: &HW<T>) -> Self
    where
        T: PartialOrd,
    {
        Self {
            sy: size.h(),
            sx: size.w(),
            ty: T::zero(),
            tx: T::zero(),
        }
    }
}

impl<T> ScaleTransform<T>
where
    T: Copy + Num + Neg<Output = T>,
{
    pub fn inverse(&self) -> Self {
        let sy = T::one() / self.sy;
        let sx = T::one() / self.sx;
        let ty = -self.ty / self.sy;
        let tx = -self.tx / self.sx;

        Self { sy, sx, ty, tx }
    }
}
