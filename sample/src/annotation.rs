//! JSON annotation files.
//!
//! An annotation file describes one image and its polygons.
//!
//! ```json
//! {
//!     "image": "receipt_0001.jpg",
//!     "boxes": [[[0.1, 0.1], [0.4, 0.1], [0.4, 0.2], [0.1, 0.2]]],
//!     "classes": ["total"],
//!     "scores": [0.98]
//! }
//! ```
//!
//! The image path is resolved relative to the directory of the annotation file.

use crate::{common::*, Sample};

/// The serialized form of a [Sample] without the raster data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFile<C> {
    pub image: PathBuf,
    pub boxes: Vec<Polygon<f64>>,
    pub classes: Vec<C>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f64>>,
}

impl<C> AnnotationFile<C>
where
    C: DeserializeOwned,
{
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read annotation file '{}'", path.display()))?;
        let annotation = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse annotation file '{}'", path.display()))?;
        Ok(annotation)
    }
}

impl<C> Sample<C>
where
    C: DeserializeOwned,
{
    /// Loads an annotation file and the image it refers to.
    pub fn load<P>(annotation_file: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let annotation_file = annotation_file.as_ref();
        let AnnotationFile {
            image: image_path,
            boxes,
            classes,
            scores,
        } = AnnotationFile::open(annotation_file)?;

        let image_file = match annotation_file.parent() {
            Some(dir) => dir.join(image_path),
            None => image_path,
        };
        let image = image::open(&image_file)
            .with_context(|| format!("failed to load image file '{}'", image_file.display()))?
            .to_rgb8();
        debug!(
            "loaded '{}' with {} boxes",
            annotation_file.display(),
            boxes.len()
        );

        Self::new(image, boxes, classes, scores).with_context(|| {
            format!(
                "invalid annotation in '{}'",
                annotation_file.display()
            )
        })
    }
}

impl<C> Sample<C>
where
    C: Serialize,
{
    /// Writes the image to `image_file` and the annotation to `annotation_file`.
    ///
    /// The annotation refers to the image by its file name, so both files
    /// are expected to live in the same directory.
    pub fn save<P, Q>(&self, image_file: P, annotation_file: Q) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let image_file = image_file.as_ref();
        let annotation_file = annotation_file.as_ref();

        self.image()
            .save(image_file)
            .with_context(|| format!("failed to write image file '{}'", image_file.display()))?;

        let image_name = image_file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| image_file.to_owned());
        let annotation = AnnotationFile {
            image: image_name,
            boxes: self.boxes().clone(),
            classes: self.classes().iter().collect::<Vec<&C>>(),
            scores: self.scores().clone(),
        };
        let text = serde_json::to_string_pretty(&annotation)?;
        std::fs::write(annotation_file, text).with_context(|| {
            format!(
                "failed to write annotation file '{}'",
                annotation_file.display()
            )
        })?;
        info!("saved sample to '{}'", annotation_file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn annotation_save_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image = RgbImage::from_pixel(6, 4, Rgb([10, 20, 30]));
        let boxes = vec![Polygon::from(vec![
            [0.0, 0.0],
            [0.5, 0.0],
            [0.5, 0.5],
            [0.0, 0.5],
        ])];
        let sample = Sample::new(image, boxes, vec!["name".to_string()], Some(vec![0.5]))?;

        let image_file = dir.path().join("sample.png");
        let annotation_file = dir.path().join("sample.json");
        sample.save(&image_file, &annotation_file)?;

        let annotation: AnnotationFile<String> = AnnotationFile::open(&annotation_file)?;
        assert_eq!(annotation.image, PathBuf::from("sample.png"));

        let loaded: Sample<String> = Sample::load(&annotation_file)?;
        assert_eq!(loaded, sample);
        Ok(())
    }

    #[test]
    fn annotation_without_scores() -> Result<()> {
        let text = r#"{ "image": "a.png", "boxes": [], "classes": [] }"#;
        let annotation: AnnotationFile<usize> = serde_json::from_str(text)?;
        assert!(annotation.scores.is_none());
        assert!(serde_json::to_string(&annotation)?.find("scores").is_none());
        Ok(())
    }

    #[test]
    fn annotation_mismatch_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::new(2, 2).save(dir.path().join("a.png"))?;
        let annotation_file = dir.path().join("a.json");
        std::fs::write(
            &annotation_file,
            r#"{ "image": "a.png", "boxes": [], "classes": ["x"] }"#,
        )?;
        assert!(Sample::<String>::load(&annotation_file).is_err());
        Ok(())
    }
}
