//! Common test fixtures for sampler and overlay tests.
//!
//! Shapes are plain `(lat, lng)` tuples so the fixtures carry no dependency
//! on the crates under test.

/// Polygon rings as `(lat, lng)` vertex lists.
pub mod shapes {
    /// Axis-aligned square of side `2 * half` centered at `(lat, lng)`.
    pub fn square(lat: f64, lng: f64, half: f64) -> Vec<(f64, f64)> {
        vec![
            (lat - half, lng - half),
            (lat - half, lng + half),
            (lat + half, lng + half),
            (lat + half, lng - half),
        ]
    }

    /// The same square rotated 45°: vertices on the axes. Fills exactly
    /// half of its bounding box.
    pub fn diamond(lat: f64, lng: f64, half: f64) -> Vec<(f64, f64)> {
        vec![
            (lat - half, lng),
            (lat, lng + half),
            (lat + half, lng),
            (lat, lng - half),
        ]
    }

    /// A long thin triangle with a tiny area relative to its bounding box.
    pub fn sliver(lat: f64, lng: f64) -> Vec<(f64, f64)> {
        vec![(lat, lng), (lat + 10.0, lng + 10.0), (lat + 10.0, lng + 10.0 + 1e-9)]
    }

    /// Rough outline of the Willamette Valley, Oregon.
    pub const WILLAMETTE: [(f64, f64); 6] = [
        (45.6, -123.2),
        (45.6, -122.4),
        (44.9, -122.6),
        (44.0, -122.9),
        (43.9, -123.3),
        (44.8, -123.5),
    ];
}

/// Rectangle corners as `(ne, sw)` pairs.
pub mod regions {
    /// Continental United States.
    pub const CONUS: ((f64, f64), (f64, f64)) = ((50.0, -65.0), (24.0, -125.0));

    /// Japanese cherry-blossom belt (Kyushu to Tohoku).
    pub const JAPAN_SAKURA: ((f64, f64), (f64, f64)) = ((41.0, 142.0), (31.0, 129.0));

    /// A single point (degenerate rectangle).
    pub const POINT: ((f64, f64), (f64, f64)) = ((10.0, 10.0), (10.0, 10.0));
}

/// Raster grid descriptions for GeoTIFF fixtures.
pub mod grid {
    /// Global 4096×4096 grid, large enough to force downsampling.
    pub const GLOBAL_LARGE: GridSpec = GridSpec {
        width: 4096,
        height: 4096,
        min_lon: -180.0,
        max_lat: 90.0,
        pixel_scale: (360.0 / 4096.0, 180.0 / 4096.0),
    };

    /// Small RGB scene.
    pub const RGB_512: GridSpec = GridSpec {
        width: 512,
        height: 512,
        min_lon: 5.0,
        max_lat: 52.0,
        pixel_scale: (0.01, 0.01),
    };

    /// Tiny grid for fast unit tests.
    pub const SIMPLE_8X4: GridSpec = GridSpec {
        width: 8,
        height: 4,
        min_lon: -10.0,
        max_lat: 10.0,
        pixel_scale: (2.5, 5.0),
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: u32,
        pub height: u32,
        /// West edge (tiepoint X)
        pub min_lon: f64,
        /// North edge (tiepoint Y)
        pub max_lat: f64,
        /// Degrees per pixel (x, y)
        pub pixel_scale: (f64, f64),
    }

    impl GridSpec {
        /// Total number of pixels.
        pub fn size(&self) -> usize {
            self.width as usize * self.height as usize
        }

        /// Bounds as `(min_lat, min_lng, max_lat, max_lng)`.
        pub fn bounds(&self) -> (f64, f64, f64, f64) {
            let max_lon = self.min_lon + self.width as f64 * self.pixel_scale.0;
            let min_lat = self.max_lat - self.height as f64 * self.pixel_scale.1;
            (min_lat, self.min_lon, self.max_lat, max_lon)
        }
    }
}
