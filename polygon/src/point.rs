use crate::{common::*, ScaleTransform};

/// A 2D point in XY order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[T; 2]", into = "[T; 2]")]
pub struct Point<T>
where
    T: Copy,
{
    pub x: T,
    pub y: T,
}

impl<T> Point<T>
where
    T: Copy,
{
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn xy(&self) -> [T; 2] {
        [self.x, self.y]
    }
}

impl<T> Point<T>
where
    T: Copy + Num,
{
    pub fn transform(&self, transform: &ScaleTransform<T>) -> Self {
        Point {
            x: self.x * transform.sx + transform.tx,
            y: self.y * transform.sy + transform.ty,
        }
    }
}

impl<T> From<[T; 2]> for Point<T>
where
    T: Copy,
{
    fn from([x, y]: [T; 2]) -> Self {
        Self { x, y }
    }
}

impl<T> From<Point<T>> for [T; 2]
where
    T: Copy,
{
    fn from(point: Point<T>) -> Self {
        point.xy()
    }
}
