use bevy::math::Vec3;

/// Three gradient anchors blended toward a dark base near zero.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub stops: [Vec3; 3],
    pub base: Vec3,
}

impl Palette {
    pub fn new(stops: [Vec3; 3], base: Vec3) -> Self {
        Self { stops, base }
    }

    /// Colour for `t` in `[0, 1]`; values outside are clamped.
    ///
    /// `sample(0)` is the base colour and `sample(1)` the last stop.
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let gradient = if t < 0.5 {
            self.stops[0].lerp(self.stops[1], t * 2.0)
        } else {
            self.stops[1].lerp(self.stops[2], (t - 0.5) * 2.0)
        };
        // Ease-out weight: only the faintest ink sinks into the base
        let weight = 1.0 - (1.0 - t) * (1.0 - t);
        self.base.lerp(gradient, weight)
    }

    /// Ink concentration to colour, through the `v^power` response curve.
    pub fn shade(&self, v: f32, scale: f32, power: f32) -> Vec3 {
        let t = (v * scale).clamp(0.0, 1.0).powf(power);
        self.sample(t)
    }
}

/// HSL (hue in degrees, s/l in `[0, 1]`) to linear-free RGB in `[0, 1]`.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    Vec3::new(r + m, g + m, b + m).clamp(Vec3::ZERO, Vec3::ONE)
}

/// Rec. 709 luma.
pub fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;

    fn palette() -> Palette {
        let cfg = RenderConfig::default();
        Palette::new(cfg.palette, cfg.base)
    }

    #[test]
    fn endpoints_are_fixed_and_distinct() {
        let p = palette();
        let first_zero = p.sample(0.0);
        let first_one = p.sample(1.0);
        // Interleave other lookups; endpoints must not move
        p.sample(0.3);
        p.sample(0.9);
        assert_eq!(p.sample(1.0), first_one);
        assert_eq!(p.sample(0.0), first_zero);
        assert_eq!(first_zero, p.base);
        assert!((first_one - p.stops[2]).length() < 1e-6);
        assert_ne!(first_zero, first_one);
    }

    #[test]
    fn brightness_is_monotonic() {
        let p = palette();
        let mut last = luminance(p.sample(0.0));
        for i in 1..=512 {
            let l = luminance(p.sample(i as f32 / 512.0));
            assert!(l + 1e-6 >= last, "luma dropped at {i}: {last} -> {l}");
            last = l;
        }
    }

    #[test]
    fn lookup_is_continuous() {
        let p = palette();
        for i in 0..1000 {
            let t = i as f32 / 1000.0;
            let step = (p.sample(t + 0.001) - p.sample(t)).length();
            assert!(step < 0.01, "jump of {step} at {t}");
        }
    }

    #[test]
    fn out_of_range_is_clamped() {
        let p = palette();
        assert_eq!(p.sample(-3.0), p.sample(0.0));
        assert_eq!(p.sample(7.0), p.sample(1.0));
        assert_eq!(p.sample(f32::NAN), p.sample(0.0));
    }

    #[test]
    fn hsl_primaries() {
        assert!((hsl_to_rgb(0.0, 1.0, 0.5) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((hsl_to_rgb(120.0, 1.0, 0.5) - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        assert!((hsl_to_rgb(240.0, 1.0, 0.5) - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
        assert!((hsl_to_rgb(-120.0, 1.0, 0.5) - hsl_to_rgb(240.0, 1.0, 0.5)).length() < 1e-5);
    }
}
