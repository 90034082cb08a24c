use crate::{common::*, Point, ScaleTransform, HW};

/// The least number of vertices a polygon must have to enclose an area.
pub const MIN_POLYGON_POINTS: usize = 3;

/// A polygon as an ordered list of vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon<T>
where
    T: Copy,
{
    points: Vec<Point<T>>,
}

impl<T> Polygon<T>
where
    T: Copy,
{
    pub fn new(points: Vec<Point<T>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if the polygon has too few vertices to enclose an area.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < MIN_POLYGON_POINTS
    }

    pub fn points(&self) -> &[Point<T>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point<T>> {
        self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point<T>> {
        self.points.iter()
    }
}

impl<T> Polygon<T>
where
    T: Copy + Num,
{
    pub fn transform(&self, transform: &ScaleTransform<T>) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|point| point.transform(transform))
                .collect(),
        }
    }
}

impl<T> Polygon<T>
where
    T: Float,
{
    /// Converts ratio coordinates to pixel coordinates of an image of `size`.
    pub fn denormalize(&self, size: &HW<T>) -> Self {
        self.transform(&ScaleTransform::from_unit_to(size))
    }

    /// Converts pixel coordinates of an image of `size` to ratio coordinates.
    pub fn normalize(&self, size: &HW<T>) -> Self {
        self.transform(&ScaleTransform::from_unit_to(size).inverse())
    }

    /// Get the min and max corners of the axis-aligned bounding rectangle.
    pub fn bounds(&self) -> Option<(Point<T>, Point<T>)> {
        let first = *self.points.first()?;
        let bounds = self.points[1..]
            .iter()
            .fold((first, first), |(min, max), point| {
                (
                    Point::new(min.x.min(point.x), min.y.min(point.y)),
                    Point::new(max.x.max(point.x), max.y.max(point.y)),
                )
            });
        Some(bounds)
    }
}

impl<T> From<Vec<Point<T>>> for Polygon<T>
where
    T: Copy,
{
    fn from(points: Vec<Point<T>>) -> Self {
        Self::new(points)
    }
}

impl<T> From<Vec<[T; 2]>> for Polygon<T>
where
    T: Copy,
{
    fn from(points: Vec<[T; 2]>) -> Self {
        Self::new(points.into_iter().map(Point::from).collect())
    }
}

impl<T> FromIterator<Point<T>> for Polygon<T>
where
    T: Copy,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Point<T>>,
    {
        Self::new(iter.into_iter().collect())
    }
}
