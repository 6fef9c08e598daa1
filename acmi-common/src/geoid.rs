//! EGM2008-shaped geoid (mean-sea-level) height grid.
//!
//! The PGM byte parsing that produces this raster is a host collaborator —
//! this module only performs bilinear interpolation over an already-decoded
//! grid.

/// A `rows x cols` raster of geoid heights (metres above/below the WGS84
/// ellipsoid), sampled on a regular lat/lon grid.
///
/// Row 0 is the north edge (`lat0`); row indices increase southward. Column
/// 0 is `lon0`; column indices increase eastward and wrap at 360 degrees.
#[derive(Clone, Debug)]
pub struct GeoidGrid {
    rows: usize,
    cols: usize,
    d_lat: f64,
    d_lon: f64,
    lat0: f64,
    lon0: f64,
    heights: Vec<i16>,
}

impl GeoidGrid {
    pub fn new(rows: usize, cols: usize, d_lat: f64, d_lon: f64, lat0: f64, lon0: f64, heights: Vec<i16>) -> Self {
        debug_assert_eq!(heights.len(), rows * cols, "geoid raster size mismatch");
        GeoidGrid { rows, cols, d_lat, d_lon, lat0, lon0, heights }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn sample(&self, row: usize, col: usize) -> f64 {
        let col = col % self.cols;
        let row = row.min(self.rows.saturating_sub(1));
        self.heights[row * self.cols + col] as f64
    }

    /// Bilinear-interpolated geoid height (metres) at `(lat_deg, lon_deg)`.
    /// Longitude wraps at 360 degrees; latitude clamps to ±90.
    pub fn height_at(&self, lat_deg: f64, lon_deg: f64) -> f64 {
        if self.rows == 0 || self.cols == 0 {
            return 0.0;
        }

        let lat = lat_deg.clamp(-90.0, 90.0);
        let mut lon = lon_deg % 360.0;
        if lon < 0.0 {
            lon += 360.0;
        }
        let mut lon0 = self.lon0 % 360.0;
        if lon0 < 0.0 {
            lon0 += 360.0;
        }

        let row_f = ((self.lat0 - lat) / self.d_lat).clamp(0.0, (self.rows - 1).max(0) as f64);
        let col_f = (lon - lon0).rem_euclid(360.0) / self.d_lon;

        let row0f = row_f.floor();
        let col0f = col_f.floor();
        let row_frac = row_f - row0f;
        let col_frac = col_f - col0f;

        let r0 = row0f as usize;
        let r1 = (r0 + 1).min(self.rows - 1);
        let c0 = (col0f as i64).rem_euclid(self.cols as i64) as usize;
        let c1 = (c0 + 1) % self.cols;

        let h00 = self.sample(r0, c0);
        let h01 = self.sample(r0, c1);
        let h10 = self.sample(r1, c0);
        let h11 = self.sample(r1, c1);

        let h0 = h00 * (1.0 - col_frac) + h01 * col_frac;
        let h1 = h10 * (1.0 - col_frac) + h11 * col_frac;
        h0 * (1.0 - row_frac) + h1 * row_frac
    }
}
