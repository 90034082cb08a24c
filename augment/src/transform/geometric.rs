//! Exact geometric transforms that permute pixels.

use super::KeypointTransform;
use crate::{common::*, KeypointData};
use image::ImageBuffer;

/// Rotates the image by a random multiple of 90 degrees clockwise.
#[derive(Debug, Clone, Default)]
pub struct RandomRotate90;

impl RandomRotate90 {
    /// Rotates by `quarters` times 90 degrees clockwise.
    pub fn rotate(data: KeypointData, quarters: usize) -> KeypointData {
        let (width, height) = data.image.dimensions();
        let (w, h) = (width as f64, height as f64);
        let KeypointData {
            image,
            keypoints,
            box_mapping,
        } = data;

        let (image, transform) = match quarters % 4 {
            0 => (image, Affine::identity()),
            1 => (
                imageops::rotate90(&image),
                Affine::from_rows([[0.0, -1.0, h], [1.0, 0.0, 0.0]]),
            ),
            2 => (
                imageops::rotate180(&image),
                Affine::from_rows([[-1.0, 0.0, w], [0.0, -1.0, h]]),
            ),
            _ => (
                imageops::rotate270(&image),
                Affine::from_rows([[0.0, 1.0, 0.0], [-1.0, 0.0, w]]),
            ),
        };

        KeypointData {
            image,
            keypoints,
            box_mapping,
        }
        .map_keypoints(&transform)
    }
}

impl KeypointTransform for RandomRotate90 {
    fn forward(&self, data: KeypointData, rng: &mut StdRng) -> Result<KeypointData> {
        let quarters = rng.gen_range(0..4);
        Ok(Self::rotate(data, quarters))
    }
}

/// Swaps the x and y axes.
#[derive(Debug, Clone, Default)]
pub struct Transpose;

impl KeypointTransform for Transpose {
    fn forward(&self, data: KeypointData, _rng: &mut StdRng) -> Result<KeypointData> {
        let KeypointData {
            image,
            keypoints,
            box_mapping,
        } = data;
        let (width, height) = image.dimensions();
        let image: RgbImage = ImageBuffer::from_fn(height, width, |x, y| *image.get_pixel(y, x));

        let output = KeypointData {
            image,
            keypoints,
            box_mapping,
        }
        .map_keypoints(&Affine::transpose());
        Ok(output)
    }
}

/// Mirrors the image left to right.
#[derive(Debug, Clone, Default)]
pub struct HorizontalFlip;

impl KeypointTransform for HorizontalFlip {
    fn forward(&self, data: KeypointData, _rng: &mut StdRng) -> Result<KeypointData> {
        let transform = Affine::horizontal_flip(data.image.width() as f64);
        let image = imageops::flip_horizontal(&data.image);
        let output = KeypointData { image, ..data }.map_keypoints(&transform);
        Ok(output)
    }
}

/// Mirrors the image top to bottom.
#[derive(Debug, Clone, Default)]
pub struct VerticalFlip;

impl KeypointTransform for VerticalFlip {
    fn forward(&self, data: KeypointData, _rng: &mut StdRng) -> Result<KeypointData> {
        let transform = Affine::vertical_flip(data.image.height() as f64);
        let image = imageops::flip_vertical(&data.image);
        let output = KeypointData { image, ..data }.map_keypoints(&transform);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::square_data;

    const MARK: Rgb<u8> = Rgb([255, 0, 0]);

    /// A 7x4 black image with one marked pixel and a keypoint at its center.
    fn marked_data() -> KeypointData {
        let mut image = RgbImage::new(7, 4);
        image.put_pixel(1, 2, MARK);
        KeypointData::new(image, vec![Point::new(1.5, 2.5)], vec![0]).unwrap()
    }

    fn assert_keypoint_on_mark(data: &KeypointData) {
        let point = data.keypoints[0];
        let pixel = data
            .image
            .get_pixel(point.x.floor() as u32, point.y.floor() as u32);
        assert_eq!(pixel, &MARK);
    }

    #[test]
    fn rotate90_keypoints_follow_pixels() {
        (0..4).for_each(|quarters| {
            let output = RandomRotate90::rotate(marked_data(), quarters);
            let expected = if quarters % 2 == 0 { (7, 4) } else { (4, 7) };
            assert_eq!(output.image.dimensions(), expected);
            assert_keypoint_on_mark(&output);
        });
    }

    #[test]
    fn rotate90_twice_equals_rotate180() {
        let input = square_data(10, 6);
        let twice = RandomRotate90::rotate(RandomRotate90::rotate(input.clone(), 1), 1);
        let once = RandomRotate90::rotate(input, 2);
        assert_eq!(twice, once);
    }

    #[test]
    fn transpose_and_flips_keypoints_follow_pixels() {
        let mut rng = StdRng::seed_from_u64(17);
        let transforms: Vec<Box<dyn KeypointTransform>> = vec![
            Box::new(Transpose),
            Box::new(HorizontalFlip),
            Box::new(VerticalFlip),
        ];
        transforms.iter().for_each(|transform| {
            let output = transform.forward(marked_data(), &mut rng).unwrap();
            assert_keypoint_on_mark(&output);
        });

        let transposed = Transpose.forward(marked_data(), &mut rng).unwrap();
        assert_eq!(transposed.image.dimensions(), (4, 7));
    }

    #[test]
    fn flips_are_involutions() {
        let mut rng = StdRng::seed_from_u64(18);
        let input = square_data(9, 5);
        let transforms: Vec<Box<dyn KeypointTransform>> = vec![
            Box::new(Transpose),
            Box::new(HorizontalFlip),
            Box::new(VerticalFlip),
        ];
        transforms.iter().for_each(|transform| {
            let once = transform.forward(input.clone(), &mut rng).unwrap();
            let twice = transform.forward(once, &mut rng).unwrap();
            assert_eq!(twice, input);
        });
    }
}
