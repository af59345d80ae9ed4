//! Sequential color scale and legend ticks.

use crate::view::ScaleDomain;

/// ColorBrewer "Blues", light to dark.
const BLUES: [[u8; 3]; 9] = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

pub const NO_DATA: [u8; 3] = [255, 255, 255];
pub const LAND: [u8; 3] = [204, 204, 204];
pub const OUTLINE: [u8; 3] = [51, 51, 51];

/// Maps values in a `[0, max]` domain onto the Blues ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BluesScale {
    pub domain: ScaleDomain,
}

impl BluesScale {
    pub fn new(domain: ScaleDomain) -> Self {
        Self { domain }
    }

    /// Interpolated color at `t` in `[0, 1]`.
    pub fn interpolate(t: f64) -> [u8; 3] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (BLUES.len() - 1) as f64;
        let i = (pos.floor() as usize).min(BLUES.len() - 2);
        let frac = pos - i as f64;
        let (a, b) = (BLUES[i], BLUES[i + 1]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
    }

    /// Fill for a region; white when the value is missing.
    pub fn color(&self, value: Option<f64>) -> [u8; 3] {
        match value {
            Some(v) => Self::interpolate(self.domain.normalize(v)),
            None => NO_DATA,
        }
    }
}

/// Round step for roughly `target_steps` intervals over `range`.
pub fn nice_step(range: f64, target_steps: usize) -> f64 {
    let raw_step = range / target_steps.max(1) as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;

    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

/// About five round ticks over the domain, plus the domain maximum.
pub fn legend_ticks(domain: &ScaleDomain) -> Vec<f64> {
    let step = nice_step(domain.max - domain.min(), 5);
    let mut ticks = Vec::new();
    if step.is_finite() && step > 0.0 {
        let mut i = 0u32;
        loop {
            let tick = domain.min() + step * i as f64;
            if tick > domain.max + step * 1e-9 {
                break;
            }
            ticks.push(tick);
            i += 1;
        }
    }
    let has_max = ticks
        .last()
        .is_some_and(|last| (last - domain.max).abs() <= domain.max * 1e-9);
    if !has_max {
        ticks.push(domain.max);
    }
    ticks
}

pub fn format_tick(value: f64) -> String {
    format!("{:.1}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ramp_ends_are_scheme_ends() {
        assert_eq!(BluesScale::interpolate(0.0), BLUES[0]);
        assert_eq!(BluesScale::interpolate(1.0), BLUES[8]);
        assert_eq!(BluesScale::interpolate(0.5), BLUES[4]);
        assert_eq!(BluesScale::interpolate(f64::NAN), BLUES[0]);
    }

    #[test]
    fn missing_values_are_white() {
        let scale = BluesScale::new(ScaleDomain { max: 10.0 });
        assert_eq!(scale.color(None), NO_DATA);
        assert_eq!(scale.color(Some(10.0)), BLUES[8]);
        assert_eq!(scale.color(Some(-3.0)), BLUES[0]);
    }

    #[test]
    fn ticks_include_domain_max() {
        assert_eq!(
            legend_ticks(&ScaleDomain { max: 50.0 }),
            vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]
        );
        assert_eq!(
            legend_ticks(&ScaleDomain { max: 70.0 }),
            vec![0.0, 20.0, 40.0, 60.0, 70.0]
        );
        assert_eq!(format_tick(12.345), "12.3");
    }
}
