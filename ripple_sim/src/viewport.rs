//! Viewport bookkeeping and the cover-fit transform that keeps the background
//! image filling the window at its native aspect ratio. Scales are applied to
//! UVs centred on (0.5, 0.5), so a value below one crops that axis.

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    width: u32,
    height: u32,
}

impl ViewportState {
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Per-axis UV scale that crops the background so it covers the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub side_a: f32,
    pub side_b: f32,
}

impl CoverFit {
    /// `image_aspect` is the background's width over height.
    pub fn resolve(viewport: ViewportState, image_aspect: f32) -> Self {
        let viewport_aspect = viewport.aspect();
        if viewport_aspect < image_aspect {
            Self {
                side_a: viewport_aspect / image_aspect,
                side_b: 1.0,
            }
        } else {
            Self {
                side_a: 1.0,
                side_b: image_aspect / viewport_aspect,
            }
        }
    }

    /// Packs `[width, height, side_a, side_b]` for the shader's resolution uniform.
    pub fn resolution_vector(&self, viewport: ViewportState) -> [f32; 4] {
        [
            viewport.width as f32,
            viewport.height as f32,
            self.side_a,
            self.side_b,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;
    const IMAGE_ASPECT: f32 = 1920.0 / 1280.0;

    fn viewport(width: u32, height: u32) -> ViewportState {
        ViewportState::new(width, height).expect("viewport")
    }

    #[test]
    fn rejects_zero_sized_viewport() {
        assert!(matches!(
            ViewportState::new(0, 720),
            Err(Error::EmptyViewport {
                width: 0,
                height: 720
            })
        ));
        assert!(ViewportState::new(1280, 0).is_err());
    }

    #[test]
    fn wide_viewport_crops_vertically() {
        let view = viewport(2000, 800);
        let fit = CoverFit::resolve(view, IMAGE_ASPECT);
        assert_eq!(fit.side_a, 1.0);
        assert!((fit.side_b - IMAGE_ASPECT / 2.5).abs() < EPSILON);
    }

    #[test]
    fn narrow_viewport_crops_horizontally() {
        let view = viewport(600, 1000);
        let fit = CoverFit::resolve(view, IMAGE_ASPECT);
        assert_eq!(fit.side_b, 1.0);
        assert!((fit.side_a - 0.6 / IMAGE_ASPECT).abs() < EPSILON);
    }

    #[test]
    fn matching_aspect_needs_no_crop() {
        let fit = CoverFit::resolve(viewport(1920, 1280), IMAGE_ASPECT);
        assert_eq!(fit, CoverFit { side_a: 1.0, side_b: 1.0 });
    }

    #[test]
    fn continuous_across_the_aspect_boundary() {
        let below = CoverFit::resolve(viewport(1499, 1000), IMAGE_ASPECT);
        let above = CoverFit::resolve(viewport(1501, 1000), IMAGE_ASPECT);
        assert!((below.side_a - above.side_a).abs() < 2e-3);
        assert!((below.side_b - above.side_b).abs() < 2e-3);
    }

    #[test]
    fn scales_never_exceed_one() {
        for (w, h) in [(1, 4000), (4000, 1), (800, 600), (1024, 1024)] {
            let fit = CoverFit::resolve(viewport(w, h), IMAGE_ASPECT);
            assert!(fit.side_a > 0.0 && fit.side_a <= 1.0);
            assert!(fit.side_b > 0.0 && fit.side_b <= 1.0);
        }
    }

    #[test]
    fn resolution_vector_packs_viewport_and_scales() {
        let view = viewport(1280, 720);
        let fit = CoverFit::resolve(view, IMAGE_ASPECT);
        let packed = fit.resolution_vector(view);
        assert_eq!(packed[0], 1280.0);
        assert_eq!(packed[1], 720.0);
        assert_eq!(packed[2], fit.side_a);
        assert_eq!(packed[3], fit.side_b);
    }
}
