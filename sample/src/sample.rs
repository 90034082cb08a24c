use crate::common::*;

/// An image with its annotated polygons.
///
/// The boxes are stored in ratio coordinates relative to the image size. Each
/// box owns exactly one class and, when scores are present, one score.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Sample<C = String> {
    #[getset(get = "pub")]
    image: RgbImage,
    #[getset(get = "pub")]
    boxes: Vec<Polygon<f64>>,
    #[getset(get = "pub")]
    classes: Vec<C>,
    #[getset(get = "pub")]
    scores: Option<Vec<f64>>,
}

impl<C> Sample<C> {
    pub fn new(
        image: RgbImage,
        boxes: Vec<Polygon<f64>>,
        classes: Vec<C>,
        scores: Option<Vec<f64>>,
    ) -> Result<Self> {
        let sample = Self {
            image,
            boxes,
            classes,
            scores,
        };
        sample.validate()?;
        Ok(sample)
    }

    /// Builds a sample without scores.
    pub fn from_boxes(image: RgbImage, boxes: Vec<Polygon<f64>>, classes: Vec<C>) -> Result<Self> {
        Self::new(image, boxes, classes, None)
    }

    /// Checks that boxes, classes and scores have the same length.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.boxes.len() == self.classes.len(),
            "the number of boxes ({}) does not match the number of classes ({})",
            self.boxes.len(),
            self.classes.len()
        );
        if let Some(scores) = &self.scores {
            ensure!(
                scores.len() == self.boxes.len(),
                "the number of scores ({}) does not match the number of boxes ({})",
                scores.len(),
                self.boxes.len()
            );
        }
        Ok(())
    }

    /// The number of annotated boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The image size in pixels.
    pub fn size(&self) -> HW<f64> {
        let (w, h) = self.image.dimensions();
        HW::from_hw([h as f64, w as f64])
    }
}
