use std::io::Write;

use anyhow::{Context, Result};
use geo::Polygon;

use crate::session::Scene;

/// Write a computed scene as a standalone SVG document.
///
/// Layer order matches the interactive lab: boundary fill, dashed domain
/// outline, mesh edges, cluster circles, mesh nodes, caption badge.
pub fn write_scene_svg(writer: &mut impl Write, scene: &Scene) -> Result<()> {
    let viewport = scene.geometry.viewport;
    let (width, height) = (viewport.width, viewport.height);
    let color = &scene.profile.color;

    writeln!(writer, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
    writeln!(
        writer,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"##
    )?;

    // Boundary (even-odd so holes stay open) and the offset-scaled domain.
    writeln!(
        writer,
        r##"<path d="{}" fill="{}" stroke="{}" stroke-width="1.2" fill-rule="evenodd"/>"##,
        polygons_to_path(&scene.geometry.boundary),
        to_rgba(color, 0.12)?,
        to_rgba(color, 0.85)?,
    )?;
    writeln!(
        writer,
        r##"<path d="{}" fill="none" stroke="{}" stroke-width="1.0" stroke-dasharray="5 3" fill-rule="evenodd"/>"##,
        polygons_to_path(&scene.geometry.domain),
        to_rgba(color, 0.95)?,
    )?;

    let fine = scene.inputs.resolution == crate::inputs::Resolution::Fine;
    let edge_width = if fine { 0.60 } else { 0.76 };
    writeln!(writer, r##"<g stroke="rgba(18,18,18,0.30)" stroke-width="{edge_width}" fill="none">"##)?;
    for edge in &scene.mesh.edges {
        let a = scene.mesh.nodes[edge.a];
        let b = scene.mesh.nodes[edge.b];
        writeln!(
            writer,
            r##"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}"/>"##,
            a.x, a.y, b.x, b.y
        )?;
    }
    writeln!(writer, "</g>")?;

    writeln!(writer, r##"<g>"##)?;
    for point in &scene.clusters.points {
        let stroke = if point.majority { "#1f7f47" } else { "#9a2f24" };
        writeln!(
            writer,
            r##"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="0.62" stroke="{stroke}" stroke-width="0.8"><title>Cluster {} | n={} | coverage={:.1}%</title></circle>"##,
            point.position.x,
            point.position.y,
            point.radius,
            rate_color(point.rate),
            point.cluster_id,
            point.n,
            point.rate * 100.0,
        )?;
    }
    writeln!(writer, "</g>")?;

    let node_radius = if fine { 1.3 } else { 1.65 };
    writeln!(writer, r##"<g fill="{color}" stroke="#fff" stroke-width="0.55">"##)?;
    for node in &scene.mesh.nodes {
        writeln!(writer, r##"<circle cx="{:.2}" cy="{:.2}" r="{node_radius}"/>"##, node.x, node.y)?;
    }
    writeln!(writer, "</g>")?;

    writeln!(
        writer,
        r##"<text x="12" y="20" fill="#6c665b" font-size="11" font-family="monospace">{} | {} | {} | {} | {}</text>"##,
        scene.inputs.state,
        scene.inputs.model.label(),
        scene.inputs.regime.label(),
        scene.inputs.resolution.label(),
        scene.inputs.vaccine,
    )?;
    writeln!(writer, "</svg>")?;
    Ok(())
}

/// Compact path string for a polygon set: every ring its own `M..L..Z`
/// subpath, holes included.
fn polygons_to_path(polygons: &[Polygon<f64>]) -> String {
    let mut out = String::new();
    for polygon in polygons {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let mut coords = ring.0.iter();
            if let Some(first) = coords.next() {
                out.push_str(&format!("M {:.2} {:.2}", first.x, first.y));
                for coord in coords {
                    out.push_str(&format!(" L {:.2} {:.2}", coord.x, coord.y));
                }
                out.push_str(" Z ");
            }
        }
    }
    out.trim_end().to_string()
}

/// `#rrggbb` plus alpha as a CSS rgba() value.
fn to_rgba(hex: &str, alpha: f64) -> Result<String> {
    let cleaned = hex.trim_start_matches('#');
    let parse = |range: std::ops::Range<usize>| -> Result<u8> {
        u8::from_str_radix(cleaned.get(range).unwrap_or_default(), 16)
            .with_context(|| format!("malformed hex color {hex:?}"))
    };
    let (r, g, b) = (parse(0..2)?, parse(2..4)?, parse(4..6)?);
    Ok(format!("rgba({r},{g},{b},{alpha})"))
}

/// Linear low-to-high coverage color ramp.
fn rate_color(rate: f64) -> String {
    let t = rate.clamp(0.0, 1.0);
    let r = (176.0 + (54.0 - 176.0) * t).round() as u8;
    let g = (56.0 + (153.0 - 56.0) * t).round() as u8;
    let b = (44.0 + (76.0 - 44.0) * t).round() as u8;
    format!("rgb({r},{g},{b})")
}
