//! Conversion between samples and keypoint data.

use crate::{common::*, KeypointData};

/// Flattens the polygons of a sample into pixel-space keypoints.
///
/// Keypoints of box 0 come first in vertex order, followed by those of box 1
/// and so on. `box_mapping` records the owning box of each keypoint.
pub fn encode<C>(sample: &Sample<C>) -> Result<KeypointData> {
    sample.validate()?;
    let size = sample.size();
    ensure!(!size.is_empty(), "cannot encode a sample with an empty image");

    let num_points: usize = sample.boxes().iter().map(|polygon| polygon.len()).sum();
    let mut keypoints = Vec::with_capacity(num_points);
    let mut box_mapping = Vec::with_capacity(num_points);

    sample
        .boxes()
        .iter()
        .enumerate()
        .for_each(|(box_index, polygon)| {
            let polygon = polygon.denormalize(&size);
            box_mapping.extend(std::iter::repeat(box_index).take(polygon.len()));
            keypoints.extend(polygon.into_points());
        });

    KeypointData::new(sample.image().clone(), keypoints, box_mapping)
}

/// Regroups transformed keypoints into a new sample.
///
/// `sample` is the sample that was encoded to produce the transform input.
/// Its classes and scores are carried over for each surviving box. A box
/// left with less than three keypoints is dropped along with its class and
/// score. Coordinates are normalized by the size of the transformed image.
pub fn decode<C>(sample: &Sample<C>, outputs: KeypointData) -> Result<Sample<C>>
where
    C: Clone,
{
    outputs.validate()?;
    let num_boxes = sample.len();
    let size = outputs.size();
    let KeypointData {
        image,
        keypoints,
        box_mapping,
    } = outputs;
    ensure!(
        !size.is_empty(),
        "the transform produced an empty image"
    );

    let mut groups: Vec<Vec<Point<f64>>> = vec![vec![]; num_boxes];
    for (point, box_index) in keypoints.into_iter().zip(box_mapping) {
        let group = groups.get_mut(box_index).ok_or_else(|| {
            format_err!(
                "keypoint refers to box {}, but the sample has only {} boxes",
                box_index,
                num_boxes
            )
        })?;
        group.push(point);
    }

    let polygons: Vec<Polygon<f64>> = groups.into_iter().map(Polygon::from).collect();
    let keeps: Vec<bool> = polygons
        .iter()
        .map(|polygon| !polygon.is_degenerate())
        .collect();
    let num_dropped = keeps.iter().filter(|&&keep| !keep).count();
    if num_dropped > 0 {
        debug!(
            "dropped {} of {} boxes with too few keypoints",
            num_dropped, num_boxes
        );
    }

    let boxes: Vec<_> = polygons
        .iter()
        .zip(&keeps)
        .filter(|(_, &keep)| keep)
        .map(|(polygon, _)| polygon.normalize(&size))
        .collect();
    let classes: Vec<_> = sample
        .classes()
        .iter()
        .zip(&keeps)
        .filter(|(_, &keep)| keep)
        .map(|(class, _)| class.clone())
        .collect();
    let scores = sample.scores().as_ref().map(|scores| {
        scores
            .iter()
            .zip(&keeps)
            .filter(|(_, &keep)| keep)
            .map(|(&score, _)| score)
            .collect()
    });

    Sample::new(image, boxes, classes, scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn polygon(points: &[[f64; 2]]) -> Polygon<f64> {
        Polygon::from(points.to_vec())
    }

    fn make_sample() -> Sample<&'static str> {
        let boxes = vec![
            polygon(&[[0.1, 0.1], [0.4, 0.1], [0.4, 0.3], [0.1, 0.3]]),
            polygon(&[[0.5, 0.5], [0.9, 0.6], [0.7, 0.9]]),
            polygon(&[[0.2, 0.6], [0.3, 0.6], [0.3, 0.7], [0.25, 0.75], [0.2, 0.7]]),
        ];
        Sample::new(
            RgbImage::new(200, 100),
            boxes,
            vec!["name", "date", "total"],
            Some(vec![0.9, 0.8, 0.7]),
        )
        .unwrap()
    }

    fn assert_polygon_eq(lhs: &Polygon<f64>, rhs: &Polygon<f64>) {
        assert_eq!(lhs.len(), rhs.len());
        lhs.iter().zip(rhs.iter()).for_each(|(lhs, rhs)| {
            assert_abs_diff_eq!(lhs.x, rhs.x, epsilon = 1e-9);
            assert_abs_diff_eq!(lhs.y, rhs.y, epsilon = 1e-9);
        });
    }

    #[test]
    fn encode_layout() {
        let sample = make_sample();
        let data = encode(&sample).unwrap();
        assert_eq!(data.box_mapping, vec![0, 0, 0, 0, 1, 1, 1, 2, 2, 2, 2, 2]);
        assert_abs_diff_eq!(data.keypoints[1].x, 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(data.keypoints[1].y, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(data.keypoints[6].x, 140.0, epsilon = 1e-9);
        assert_abs_diff_eq!(data.keypoints[6].y, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn identity_round_trip() {
        let sample = make_sample();
        let decoded = decode(&sample, encode(&sample).unwrap()).unwrap();
        assert_eq!(decoded.classes(), sample.classes());
        assert_eq!(decoded.scores(), sample.scores());
        assert_eq!(decoded.image(), sample.image());
        decoded
            .boxes()
            .iter()
            .zip(sample.boxes())
            .for_each(|(lhs, rhs)| assert_polygon_eq(lhs, rhs));
    }

    #[test]
    fn removed_polygon_is_dropped_with_its_class() {
        let sample = make_sample();
        let mut data = encode(&sample).unwrap();
        let (keypoints, box_mapping): (Vec<_>, Vec<_>) = data
            .keypoints
            .into_iter()
            .zip(data.box_mapping)
            .filter(|&(_, box_index)| box_index != 1)
            .unzip();
        data.keypoints = keypoints;
        data.box_mapping = box_mapping;

        let decoded = decode(&sample, data).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.classes(), &vec!["name", "total"]);
        assert_eq!(decoded.scores(), &Some(vec![0.9, 0.7]));
        assert_polygon_eq(&decoded.boxes()[0], &sample.boxes()[0]);
        assert_polygon_eq(&decoded.boxes()[1], &sample.boxes()[2]);
    }

    #[test]
    fn polygon_with_two_points_is_dropped() {
        let sample = make_sample();
        let mut data = encode(&sample).unwrap();
        // box 0 keeps two of its four vertices, box 2 keeps three of five
        let drops = [2, 3, 8, 10];
        let (keypoints, box_mapping): (Vec<_>, Vec<_>) = data
            .keypoints
            .into_iter()
            .zip(data.box_mapping)
            .enumerate()
            .filter(|(index, _)| !drops.contains(index))
            .map(|(_, pair)| pair)
            .unzip();
        data.keypoints = keypoints;
        data.box_mapping = box_mapping;

        let decoded = decode(&sample, data).unwrap();
        assert_eq!(decoded.classes(), &vec!["date", "total"]);
        assert_eq!(decoded.boxes()[1].len(), 3);
        assert_eq!(decoded.boxes().len(), decoded.classes().len());
    }

    #[test]
    fn decode_keeps_box_order_for_interleaved_keypoints() {
        let sample = make_sample();
        let data = encode(&sample).unwrap();
        let (keypoints, box_mapping): (Vec<_>, Vec<_>) = data
            .keypoints
            .iter()
            .copied()
            .zip(data.box_mapping.iter().copied())
            .rev()
            .unzip();
        let reversed = KeypointData::new(data.image.clone(), keypoints, box_mapping).unwrap();

        let decoded = decode(&sample, reversed).unwrap();
        assert_eq!(decoded.classes(), sample.classes());
        let expect: Polygon<f64> = sample.boxes()[0].iter().rev().copied().collect();
        assert_polygon_eq(&decoded.boxes()[0], &expect);
    }

    #[test]
    fn decode_normalizes_by_output_size() {
        let sample = make_sample();
        let mut data = encode(&sample).unwrap();
        data.image = RgbImage::new(400, 50);
        data = data.map_keypoints(&Affine::scaling(2.0, 0.5));

        let decoded = decode(&sample, data).unwrap();
        assert_eq!(decoded.image().dimensions(), (400, 50));
        decoded
            .boxes()
            .iter()
            .zip(sample.boxes())
            .for_each(|(lhs, rhs)| assert_polygon_eq(lhs, rhs));
    }

    #[test]
    fn decode_rejects_unknown_box() {
        let sample = make_sample();
        let mut data = encode(&sample).unwrap();
        data.box_mapping[0] = 3;
        assert!(decode(&sample, data).is_err());

        let mut data = encode(&sample).unwrap();
        data.box_mapping.pop();
        assert!(decode(&sample, data).is_err());
    }

    #[test]
    fn empty_sample_round_trip() {
        let sample: Sample<u32> = Sample::new(RgbImage::new(3, 3), vec![], vec![], None).unwrap();
        let data = encode(&sample).unwrap();
        assert!(data.keypoints.is_empty());
        let decoded = decode(&sample, data).unwrap();
        assert!(decoded.is_empty());
        assert!(decoded.scores().is_none());
    }

    #[test]
    fn encode_rejects_empty_image() {
        let sample: Sample<u32> = Sample::new(RgbImage::new(0, 3), vec![], vec![], None).unwrap();
        assert!(encode(&sample).is_err());
    }
}
