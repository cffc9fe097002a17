use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use std::collections::BTreeMap;

use super::preprocessing::FOREGROUND;
use crate::models::LabelMap;

/// Bounding box and size of one labelled region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBounds {
    pub label: i32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl RegionBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Collect the bounds of every region label (>= 2), ascending by label
pub fn region_bounds(labels: &LabelMap) -> Vec<RegionBounds> {
    let mut regions: BTreeMap<i32, (u32, u32, u32, u32, u32)> = BTreeMap::new();

    for (x, y, label) in labels.enumerate() {
        if label < LabelMap::FIRST_REGION {
            continue; // background, unknown and watershed lines
        }

        regions
            .entry(label)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    regions
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| RegionBounds {
            label,
            min_x,
            min_y,
            max_x,
            max_y,
            pixel_count: count,
        })
        .collect()
}

/// Binary mask of a single region, cropped to its bounds with a one pixel
/// margin so that no foreground touches the mask border
pub fn region_mask(labels: &LabelMap, region: &RegionBounds) -> GrayImage {
    let mut mask = GrayImage::new(region.width() + 2, region.height() + 2);
    for y in region.min_y..=region.max_y {
        for x in region.min_x..=region.max_x {
            if labels.get(x, y) == region.label {
                mask.put_pixel(x - region.min_x + 1, y - region.min_y + 1, Luma([FOREGROUND]));
            }
        }
    }
    mask
}

/// Outermost borders of a region in image coordinates. Holes and anything
/// nested inside them are ignored; a disjoint region yields several borders.
pub fn external_contours(labels: &LabelMap, region: &RegionBounds) -> Vec<Vec<Point<i32>>> {
    let mask = region_mask(labels, region);
    let offset_x = region.min_x as i32 - 1;
    let offset_y = region.min_y as i32 - 1;

    find_contours::<i32>(&mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(p.x + offset_x, p.y + offset_y))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(labels: &mut LabelMap, label: i32, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                labels.set(x, y, label);
            }
        }
    }

    #[test]
    fn bounds_are_sorted_by_label() {
        let mut labels = LabelMap::new(30, 30, LabelMap::BACKGROUND);
        paint(&mut labels, 7, 1, 1, 5, 5);
        paint(&mut labels, 3, 20, 20, 30, 25);
        labels.set(10, 10, LabelMap::BOUNDARY);

        let bounds = region_bounds(&labels);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].label, 3);
        assert_eq!((bounds[0].min_x, bounds[0].max_x), (20, 29));
        assert_eq!(bounds[0].pixel_count, 50);
        assert_eq!(bounds[1].label, 7);
        assert_eq!((bounds[1].width(), bounds[1].height()), (4, 4));
    }

    #[test]
    fn contour_is_in_image_coordinates() {
        let mut labels = LabelMap::new(40, 40, LabelMap::BACKGROUND);
        paint(&mut labels, 2, 10, 12, 20, 22);

        let bounds = region_bounds(&labels);
        let contours = external_contours(&labels, &bounds[0]);
        assert_eq!(contours.len(), 1);
        let xs: Vec<i32> = contours[0].iter().map(|p| p.x).collect();
        let ys: Vec<i32> = contours[0].iter().map(|p| p.y).collect();
        assert_eq!(xs.iter().min(), Some(&10));
        assert_eq!(xs.iter().max(), Some(&19));
        assert_eq!(ys.iter().min(), Some(&12));
        assert_eq!(ys.iter().max(), Some(&21));
    }

    #[test]
    fn ring_yields_single_outer_border() {
        let mut labels = LabelMap::new(30, 30, LabelMap::BACKGROUND);
        paint(&mut labels, 2, 5, 5, 25, 25);
        paint(&mut labels, LabelMap::BACKGROUND, 10, 10, 20, 20);

        let bounds = region_bounds(&labels);
        assert_eq!(external_contours(&labels, &bounds[0]).len(), 1);
    }

    #[test]
    fn disjoint_region_yields_one_border_per_piece() {
        let mut labels = LabelMap::new(30, 10, LabelMap::BACKGROUND);
        paint(&mut labels, 4, 1, 1, 6, 6);
        paint(&mut labels, 4, 20, 1, 26, 6);

        let bounds = region_bounds(&labels);
        assert_eq!(bounds.len(), 1);
        assert_eq!(external_contours(&labels, &bounds[0]).len(), 2);
    }
}
