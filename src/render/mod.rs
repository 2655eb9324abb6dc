mod svg;

pub use svg::write_scene_svg;
