//! ASCII plotting of a light curve for terminal output.
//!
//! Fixed-size character grid, deterministic output (golden tests rely on it).
//!
//! Plot elements:
//! - finite points: `o`
//! - running median of the flux, one value per grid column: `-` line

use crate::domain::{LightCurve, Renderer};
use crate::error::LightCurveError;
use crate::math::median_mut;

/// [`Renderer`] drawing flux against time on a `width` x `height` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiRenderer {
    pub width: usize,
    pub height: usize,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new(80, 20)
    }
}

impl Renderer for AsciiRenderer {
    fn render(&self, lc: &LightCurve) -> Result<String, LightCurveError> {
        Ok(render_ascii_plot(lc, self.width, self.height))
    }
}

/// Render `lc` as text. Non-finite points are left out.
pub fn render_ascii_plot(lc: &LightCurve, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = lc
        .time()
        .iter()
        .zip(lc.flux())
        .filter(|(t, f)| t.is_finite() && f.is_finite())
        .map(|(&t, &f)| (t, f))
        .collect();
    let (Some((t_min, t_max)), Some((y_min, y_max))) = (
        span(points.iter().map(|p| p.0)),
        span(points.iter().map(|p| p.1)),
    ) else {
        return "Plot: no finite points\n".to_string();
    };
    let (t_min, t_max) = widen_flat(t_min, t_max);
    let (y_min, y_max) = widen_flat(y_min, y_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); width];
    for &(t, f) in &points {
        columns[map_x(t, t_min, t_max, width)].push(f);
    }
    let trend: Vec<(usize, usize)> = columns
        .iter_mut()
        .enumerate()
        .filter_map(|(x, values)| Some((x, map_y(median_mut(values)?, y_min, y_max, height))))
        .collect();
    draw_curve(&mut grid, &trend);

    for &(t, f) in &points {
        let x = map_x(t, t_min, t_max, width);
        let y = map_y(f, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: time=[{t_min:.3}, {t_max:.3}] d | flux=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

fn widen_flat(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (largest flux).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], cells: &[(usize, usize)]) {
    let mut prev = None;
    for &(x, y) in cells {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, '-'),
            None => grid[y][x] = '-',
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Collaborators;

    #[test]
    fn plot_golden_snapshot_small() {
        let lc = LightCurve::new(vec![0.0, 3.0, 6.0, 9.0], vec![0.0, 1.0, 2.0, 3.0]).unwrap();

        let txt = render_ascii_plot(&lc, 10, 5);
        let expected = concat!(
            "Plot: time=[0.000, 9.000] d | flux=[-0.15, 3.15]\n",
            "        -o\n",
            "      o-  \n",
            "    --    \n",
            "  -o      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let lc = LightCurve::new(vec![0.0, 1.0, f64::NAN], vec![1.0, f64::NAN, 2.0]).unwrap();
        let txt = render_ascii_plot(&lc, 10, 5);
        let marks: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(marks, 1);
        assert!(txt.starts_with("Plot: time=[-0.500, 0.500] d"));
    }

    #[test]
    fn empty_curve_renders_placeholder() {
        let lc = LightCurve::new(vec![], vec![]).unwrap();
        assert_eq!(render_ascii_plot(&lc, 20, 8), "Plot: no finite points\n");
    }

    #[test]
    fn renderer_is_reachable_through_collaborators() {
        let lc = LightCurve::new(vec![0.0, 1.0], vec![1.0, 2.0]).unwrap();
        let collaborators = Collaborators::new().with_renderer(AsciiRenderer::new(12, 6));
        let txt = lc.render(&collaborators).unwrap();
        assert_eq!(txt.lines().count(), 7);
        assert!(txt.lines().skip(1).all(|l| l.chars().count() == 12));
    }
}
