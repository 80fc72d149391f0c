// Low-level image algorithms behind the segmenter.
// Visual expectation: a green-screen frame goes in, the outline of whatever is
// standing in front of the screen comes out.
use image::RgbaImage;

use crate::config::ChromaKey;
use crate::types::{Mask, Point};

/// 8 neighbours, clockwise on screen (y grows downward): E, SE, S, SW, W, NW, N, NE.
const DIRS: [(i32, i32); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
const WEST: usize = 4;

/// RGB -> HSV using OpenCV's 8-bit convention: H in 0..180, S and V in 0..255.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 { h += 360.0; }

    ((h / 2.0).round().min(179.0) as u8, s.round() as u8, v as u8)
}

/// Foreground mask: true wherever the pixel is *outside* the key band.
/// Visual: the green screen turns to false, you turn to true.
pub fn chroma_key_mask(img: &RgbaImage, key: &ChromaKey) -> Mask {
    let (w, h) = img.dimensions();
    let mut mask = Mask::new(w as usize, h as usize);
    let inside = |v: u8, band: (u8, u8)| v >= band.0 && v <= band.1;

    for (x, y, px) in img.enumerate_pixels() {
        let (hh, ss, vv) = rgb_to_hsv(px[0], px[1], px[2]);
        let keyed = inside(hh, key.hue) && inside(ss, key.sat) && inside(vv, key.val);
        mask.set(x as i32, y as i32, !keyed);
    }
    mask
}

/// Outer boundary of every 8-connected foreground region, in raster order of
/// each region's first pixel. Points are pixel coordinates (y down).
pub fn outer_contours(mask: &Mask) -> Vec<Vec<Point>> {
    let mut labelled = vec![false; mask.width * mask.height];
    let mut contours = Vec::new();
    let mut stack = Vec::new();

    for y in 0..mask.height as i32 {
        for x in 0..mask.width as i32 {
            let idx = y as usize * mask.width + x as usize;
            if !mask.get(x, y) || labelled[idx] { continue; }

            // First pixel of a new region: its W, NW, N and NE neighbours are
            // background, so it sits on the outer boundary.
            labelled[idx] = true;
            stack.push((x, y));
            while let Some((cx, cy)) = stack.pop() {
                for (dx, dy) in DIRS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !mask.get(nx, ny) { continue; }
                    let nidx = ny as usize * mask.width + nx as usize;
                    if !labelled[nidx] {
                        labelled[nidx] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            let chain = trace_outer(mask, x, y);
            contours.push(chain.into_iter().map(|(px, py)| Point::new(px as f32, py as f32)).collect());
        }
    }
    contours
}

/// First foreground neighbour of (x, y), scanning clockwise from `start`.
fn next_neighbour(mask: &Mask, x: i32, y: i32, start: usize) -> Option<usize> {
    (0..8).map(|i| (start + i) % 8).find(|&k| {
        let (dx, dy) = DIRS[k];
        mask.get(x + dx, y + dy)
    })
}

/// Moore-neighbour boundary walk with Jacob's stopping rule.
fn trace_outer(mask: &Mask, sx: i32, sy: i32) -> Vec<(i32, i32)> {
    let mut chain = vec![(sx, sy)];
    let Some(first) = next_neighbour(mask, sx, sy, WEST) else {
        return chain; // isolated pixel
    };

    let (mut x, mut y, mut k) = (sx, sy, first);
    let limit = 4 * mask.width * mask.height + 8;
    for _ in 0..limit {
        x += DIRS[k].0;
        y += DIRS[k].1;
        // Resume scanning at the background pixel checked just before this one.
        let back = if k % 2 == 0 { (k + 6) % 8 } else { (k + 5) % 8 };
        let next = next_neighbour(mask, x, y, back).unwrap_or((k + 4) % 8);
        if (x, y) == (sx, sy) && next == first { break; }
        chain.push((x, y));
        k = next;
    }
    chain
}

/// Enclosed area of a closed polygon (shoelace, always >= 0).
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 { return 0.0; }
    let mut twice = 0.0f32;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() * 0.5
}

/// Rasterize a pixel-chain contour with its interior filled (holes included).
/// Visual: a solid white silhouette, boundary pixels and all.
pub fn fill_contour(contour: &[Point], width: usize, height: usize) -> Mask {
    let mut mask = Mask::new(width, height);
    let n = contour.len();
    let mut xs: Vec<f32> = Vec::new();

    if n >= 3 {
        for y in 0..height {
            let yf = y as f32;
            xs.clear();
            for i in 0..n {
                let a = contour[i];
                let b = contour[(i + 1) % n];
                // Half-open rule so shared vertices count once.
                if (a.y <= yf && b.y > yf) || (b.y <= yf && a.y > yf) {
                    xs.push(a.x + (yf - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.chunks_exact(2) {
                let x0 = pair[0].ceil() as i32;
                let x1 = pair[1].floor() as i32;
                for x in x0..=x1 {
                    mask.set(x, y as i32, true);
                }
            }
        }
    }

    for p in contour {
        mask.set(p.x as i32, p.y as i32, true);
    }
    mask
}

/// Ramer-Douglas-Peucker for a closed outline. Keeps concave corners; only
/// drops points closer than `tolerance` to the simplified edge.
pub fn simplify_closed(points: &[Point], tolerance: f32) -> Vec<Point> {
    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if pts.last() != Some(&p) { pts.push(p); }
    }
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() < 3 { return pts; }

    // Split the loop at the point farthest from the first one.
    let origin = pts[0];
    let far = (1..pts.len())
        .max_by(|&a, &b| dist2(pts[a], origin).total_cmp(&dist2(pts[b], origin)))
        .unwrap_or(1);

    let mut out = rdp(&pts[..=far], tolerance);
    out.pop();
    let mut back_half: Vec<Point> = pts[far..].to_vec();
    back_half.push(origin);
    let mut tail = rdp(&back_half, tolerance);
    tail.pop();
    out.extend(tail);
    out
}

fn rdp(points: &[Point], tolerance: f32) -> Vec<Point> {
    if points.len() < 3 { return points.to_vec(); }
    let first = points[0];
    let last = points[points.len() - 1];

    let (mut max_d, mut max_i) = (0.0f32, 0usize);
    for (i, &p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = segment_distance(p, first, last);
        if d > max_d { max_d = d; max_i = i; }
    }

    if max_d > tolerance {
        let mut left = rdp(&points[..=max_i], tolerance);
        left.pop();
        left.extend(rdp(&points[max_i..], tolerance));
        left
    } else {
        vec![first, last]
    }
}

#[inline]
fn dist2(a: Point, b: Point) -> f32 {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    dx * dx + dy * dy
}

/// Distance from `p` to the segment a-b.
fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let len2 = dist2(a, b);
    if len2 == 0.0 { return dist2(p, a).sqrt(); }
    let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len2).clamp(0.0, 1.0);
    dist2(p, Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))).sqrt()
}
