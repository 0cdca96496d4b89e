use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::{
    error::{Result, SignatureError},
    io::ensure_parent_dir,
    types::{Drawing, VectorPath},
};

fn path_data(path: &VectorPath) -> String {
    let mut d = String::new();
    for (i, [x, y]) in path.points().iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        // Writing into a String cannot fail
        let _ = write!(d, "{command} {x} {y} ");
    }
    d.push('Z');
    d
}

impl Drawing {
    /// Render as a standalone SVG document: one filled black `<path>` per traced region.
    pub fn to_svg_string(&self) -> String {
        let mut svg = String::new();
        let _ = writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        for (idx, path) in self.paths.iter().enumerate() {
            let _ = writeln!(
                svg,
                r#"  <path id="stroke-{idx}" fill="black" stroke="none" d="{}" />"#,
                path_data(path)
            );
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Write the SVG document, creating parent directories.
    pub fn save_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        std::fs::write(path, self.to_svg_string()).map_err(|source| SignatureError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), paths = self.paths.len(), "Saved drawing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> VectorPath {
        VectorPath::new(vec![[1.0, 2.0], [10.0, 2.0], [5.0, 8.5]]).expect("Should build triangle")
    }

    #[test]
    fn test_svg_has_canvas_and_closed_filled_paths() {
        let drawing = Drawing::new(120, 45, vec![triangle(), triangle()]);
        let svg = drawing.to_svg_string();

        assert!(svg.contains(r#"width="120" height="45" viewBox="0 0 120 45""#));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert!(svg.contains(r#"d="M 1 2 L 10 2 L 5 8.5 Z""#));
        assert!(svg.contains(r#"fill="black""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_drawing_is_valid_document() {
        let svg = Drawing::new(10, 10, vec![]).to_svg_string();
        assert!(!svg.contains("<path"));
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_save_svg_creates_directories() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("out/vector.svg");

        Drawing::new(20, 20, vec![triangle()]).save_svg(&path).expect("Should save svg");
        let written = std::fs::read_to_string(&path).expect("Should read svg back");
        assert!(written.contains("<path "));
    }
}
