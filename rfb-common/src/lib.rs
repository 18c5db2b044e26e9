//! Common types and utilities for the RFB decoding crates.
//!
//! This crate provides shared geometry used across the workspace:
//! - [`Rect`] - Rectangle with position and dimensions
//! - [`Tiles`] - Row-major iterator over the fixed-size tiles covering a [`Rect`]

/// A rectangle defined by top-left position and dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the right edge (x + width).
    pub const fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Get the bottom edge (y + height).
    pub const fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Get the area of the rectangle.
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of tile columns and rows needed to cover this rectangle.
    ///
    /// ```
    /// use rfb_common::Rect;
    ///
    /// let r = Rect::new(10, 20, 130, 70);
    /// assert_eq!(r.tile_grid(64), (3, 2));
    /// ```
    pub const fn tile_grid(&self, tile_size: u32) -> (u32, u32) {
        (
            self.width.div_ceil(tile_size),
            self.height.div_ceil(tile_size),
        )
    }

    /// Iterate over the `tile_size` x `tile_size` tiles covering this rectangle.
    ///
    /// Tiles are yielded left-to-right, top-to-bottom, in absolute coordinates.
    /// Tiles on the right and bottom edges are clipped to the rectangle, so the
    /// tiles cover every pixel exactly once.
    ///
    /// # Panics
    ///
    /// Panics if `tile_size` is zero.
    ///
    /// ```
    /// use rfb_common::Rect;
    ///
    /// let sizes: Vec<_> = Rect::new(0, 0, 100, 10)
    ///     .tiles(64)
    ///     .map(|t| (t.width, t.height))
    ///     .collect();
    /// assert_eq!(sizes, vec![(64, 10), (36, 10)]);
    /// ```
    pub fn tiles(&self, tile_size: u32) -> Tiles {
        assert!(tile_size > 0, "tile size must be non-zero");
        Tiles {
            area: *self,
            tile_size,
            tx: 0,
            ty: 0,
        }
    }
}

/// Iterator returned by [`Rect::tiles`].
#[derive(Debug, Clone)]
pub struct Tiles {
    area: Rect,
    tile_size: u32,
    // Offsets relative to the rectangle origin
    tx: u32,
    ty: u32,
}

impl Iterator for Tiles {
    type Item = Rect;

    fn next(&mut self) -> Option<Rect> {
        if self.area.is_empty() || self.ty >= self.area.height {
            return None;
        }

        let width = self.tile_size.min(self.area.width - self.tx);
        let height = self.tile_size.min(self.area.height - self.ty);
        let tile = Rect::new(
            self.area.x + self.tx as i32,
            self.area.y + self.ty as i32,
            width,
            height,
        );

        self.tx += self.tile_size;
        if self.tx >= self.area.width {
            self.tx = 0;
            self.ty += self.tile_size;
        }

        Some(tile)
    }
}
