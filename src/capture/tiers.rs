//! Zoom-level to capture-resolution tier selection.
//!
//! Higher zoom shows a smaller slice of the frame, so the same terminal
//! grid benefits from more source pixels. Tiers are monotonic in both
//! zoom threshold and resolution, capped at the top tier.

/// One capture resolution tier: used while `zoom < max_zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionTier {
    /// Exclusive zoom upper bound for this tier; the last tier uses
    /// `f32::INFINITY`.
    pub max_zoom: f32,
    pub width: u32,
    pub height: u32,
}

/// Ordered tier table mapping zoom levels to capture resolutions.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomTiers {
    tiers: Vec<ResolutionTier>,
}

impl Default for ZoomTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                ResolutionTier {
                    max_zoom: 2.0,
                    width: 640,
                    height: 480,
                },
                ResolutionTier {
                    max_zoom: 3.0,
                    width: 960,
                    height: 540,
                },
                ResolutionTier {
                    max_zoom: 4.0,
                    width: 1280,
                    height: 720,
                },
                ResolutionTier {
                    max_zoom: f32::INFINITY,
                    width: 1920,
                    height: 1080,
                },
            ],
        }
    }
}

impl ZoomTiers {
    /// Build from a tier list; sorts by threshold and appends an open
    /// top tier bound. Returns `None` for an empty list.
    pub fn new(mut tiers: Vec<ResolutionTier>) -> Option<Self> {
        if tiers.is_empty() {
            return None;
        }
        tiers.sort_by(|a, b| a.max_zoom.total_cmp(&b.max_zoom));
        if let Some(last) = tiers.last_mut() {
            last.max_zoom = f32::INFINITY;
        }
        Some(Self { tiers })
    }

    /// Index of the tier covering `zoom`.
    pub fn select(&self, zoom: f32) -> usize {
        self.tiers
            .iter()
            .position(|t| zoom < t.max_zoom)
            .unwrap_or(self.tiers.len() - 1)
    }

    /// Capture dimensions of tier `index`.
    pub fn resolution(&self, index: usize) -> (u32, u32) {
        let t = &self.tiers[index.min(self.tiers.len() - 1)];
        (t.width, t.height)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_monotonic() {
        let tiers = ZoomTiers::default();
        assert_eq!(tiers.select(1.0), 0);
        assert_eq!(tiers.select(1.9), 0);
        assert_eq!(tiers.select(2.0), 1);
        assert_eq!(tiers.select(2.5), 1);
        assert_eq!(tiers.select(3.5), 2);
        assert_eq!(tiers.select(4.0), 3);
        assert_eq!(tiers.select(100.0), 3);
    }

    #[test]
    fn test_resolution_lookup() {
        let tiers = ZoomTiers::default();
        assert_eq!(tiers.resolution(0), (640, 480));
        assert_eq!(tiers.resolution(3), (1920, 1080));
        // Out-of-range index saturates at the top tier.
        assert_eq!(tiers.resolution(99), (1920, 1080));
    }

    #[test]
    fn test_custom_tiers_sorted_and_capped() {
        let tiers = ZoomTiers::new(vec![
            ResolutionTier {
                max_zoom: 5.0,
                width: 1280,
                height: 720,
            },
            ResolutionTier {
                max_zoom: 2.0,
                width: 320,
                height: 240,
            },
        ])
        .unwrap();
        assert_eq!(tiers.select(1.0), 0);
        assert_eq!(tiers.resolution(0), (320, 240));
        // Last tier is open-ended even if the input gave it a bound.
        assert_eq!(tiers.select(50.0), 1);
    }

    #[test]
    fn test_empty_tier_list_rejected() {
        assert!(ZoomTiers::new(Vec::new()).is_none());
    }
}
