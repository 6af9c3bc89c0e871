//! Pure rectangle arithmetic for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Everything is integer math; nothing here ever rounds.

/// Axis-aligned pixel rectangle, half-open on the right and bottom edges.
///
/// Mirrors what content detection reports: `(left, top)` is the first
/// visible pixel, `(right, bottom)` is one past the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    /// Build a rect, returning `None` when the edges are inverted.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Option<Self> {
        (left <= right && top <= bottom).then_some(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Smallest rect containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Union of every rect in the slice, or `None` for an empty slice.
///
/// min/max are commutative, so the result does not depend on input order.
pub fn union_rect(rects: &[Rect]) -> Option<Rect> {
    let (first, rest) = rects.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
}

/// Canvas size of a crop once the border is added on both sides.
///
/// # Examples
/// ```
/// # use autocrop::imaging::{Rect, padded_size};
/// let rect = Rect::new(5, 5, 15, 25).unwrap();
/// assert_eq!(padded_size(&rect, (2, 3)), (14, 26));
/// ```
pub fn padded_size(rect: &Rect, border: (u32, u32)) -> (u32, u32) {
    (
        rect.width() + 2 * border.0,
        rect.height() + 2 * border.1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(l: u32, t: u32, r: u32, b: u32) -> Rect {
        Rect::new(l, t, r, b).unwrap()
    }

    #[test]
    fn new_rejects_inverted_edges() {
        assert!(Rect::new(5, 0, 4, 10).is_none());
        assert!(Rect::new(0, 5, 10, 4).is_none());
    }

    #[test]
    fn new_allows_empty_rect() {
        let r = rect(3, 3, 3, 3);
        assert_eq!(r.width(), 0);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn width_height_area() {
        let r = rect(2, 4, 12, 9);
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 5);
        assert_eq!(r.area(), 50);
    }

    #[test]
    fn union_takes_outer_edges() {
        let a = rect(0, 5, 10, 15);
        let b = rect(5, 0, 20, 10);
        assert_eq!(a.union(&b), rect(0, 0, 20, 15));
    }

    #[test]
    fn union_rect_empty_is_none() {
        assert_eq!(union_rect(&[]), None);
    }

    #[test]
    fn union_rect_single_is_identity() {
        let r = rect(1, 2, 3, 4);
        assert_eq!(union_rect(&[r]), Some(r));
    }

    #[test]
    fn union_rect_is_order_independent() {
        let rects = [rect(0, 5, 10, 15), rect(5, 0, 20, 10), rect(8, 8, 9, 30)];
        let expected = union_rect(&rects);

        let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for perm in permutations {
            let shuffled: Vec<Rect> = perm.iter().map(|&i| rects[i]).collect();
            assert_eq!(union_rect(&shuffled), expected, "permutation {perm:?}");
        }
        assert_eq!(expected, Some(rect(0, 0, 20, 30)));
    }

    #[test]
    fn padded_size_adds_border_twice() {
        assert_eq!(padded_size(&rect(0, 0, 10, 10), (0, 0)), (10, 10));
        assert_eq!(padded_size(&rect(0, 0, 10, 10), (1, 4)), (12, 18));
    }
}
