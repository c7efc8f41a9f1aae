use glam::{Mat4, Vec3};
use std::f32::consts::TAU;

/// Deterministic generator for instance placement (splitmix64).
#[derive(Debug, Clone)]
pub struct ScatterRng {
    state: u64,
}

impl ScatterRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }
}

/// Model matrices for `amount` instances spread over a disc of `radius`.
///
/// Each instance gets a uniform scale in `[0.5, 0.99]`, a whole-degree
/// rotation about Y, and a position sampled uniformly over the disc. The
/// matrix is `scale * rotate * translate`, so the offset is applied in the
/// instance's scaled and rotated frame.
pub fn scatter_instances(amount: u32, radius: f32, seed: u64) -> Vec<Mat4> {
    let mut rng = ScatterRng::new(seed);
    (0..amount)
        .map(|_| {
            let scale = (rng.next_u32() % 50) as f32 / 100.0 + 0.5;
            let angle = ((rng.next_u32() % 360) as f32).to_radians();
            let r1 = (rng.next_u32() % 101) as f32 / 101.0;
            let r2 = (rng.next_u32() % 101) as f32 / 101.0;
            let x = radius * r1.sqrt() * (TAU * r2).cos();
            let z = radius * r1.sqrt() * (TAU * r2).sin();

            Mat4::from_scale(Vec3::splat(scale))
                * Mat4::from_rotation_y(angle)
                * Mat4::from_translation(Vec3::new(x, 0.0, z))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ScatterRng::new(7);
        let mut b = ScatterRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert_ne!(ScatterRng::new(1).next_u64(), ScatterRng::new(2).next_u64());
    }

    #[test]
    fn scatter_is_deterministic() {
        assert_eq!(scatter_instances(32, 15.0, 42), scatter_instances(32, 15.0, 42));
        assert_ne!(scatter_instances(32, 15.0, 42), scatter_instances(32, 15.0, 43));
        assert_eq!(scatter_instances(3000, 15.0, 1).len(), 3000);
        assert!(scatter_instances(0, 15.0, 1).is_empty());
    }

    #[test]
    fn instances_stay_on_the_disc() {
        for m in scatter_instances(500, 15.0, 9) {
            let (scale, _, translation) = m.to_scale_rotation_translation();
            assert!(scale.x >= 0.5 - 1e-5 && scale.x < 1.0);
            assert!((scale.x - scale.y).abs() < 1e-4);
            assert!(translation.y.abs() < 1e-4);
            // translation is scaled, so it never leaves the radius
            assert!(translation.x.hypot(translation.z) <= 15.0 + 1e-3);
        }
    }

    #[test]
    fn rotation_is_a_whole_number_of_degrees() {
        for m in scatter_instances(200, 15.0, 5) {
            let (_, rotation, _) = m.to_scale_rotation_translation();
            let (axis, angle) = rotation.to_axis_angle();
            let mut degrees = angle.to_degrees();
            if axis.y < 0.0 {
                degrees = 360.0 - degrees;
            }
            assert!(degrees > -0.05 && degrees < 360.05, "{degrees}");
            assert!((degrees - degrees.round()).abs() < 0.05, "{degrees}");
        }
    }
}
