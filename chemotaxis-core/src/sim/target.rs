use crate::config::TargetConfig;
use crate::geometry::{Bounds, Vec2};
use crate::rng::SeededRng;

/// The drifting nutrition source agents steer toward.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    position: Vec2,
    heading: Vec2,
    speed: f64,
}

impl Target {
    /// A motionless target; it starts drifting after the first retarget.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            heading: Vec2::ZERO,
            speed: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn heading(&self) -> Vec2 {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Resamples both heading components independently, then the speed.
    pub fn retarget(&mut self, rng: &mut SeededRng, config: &TargetConfig) {
        let x = rng.range(-config.heading_x_range, config.heading_x_range);
        let y = rng.range(-config.heading_y_range, config.heading_y_range);
        self.heading = Vec2::new(x, y);
        self.speed = rng.range(config.min_speed, config.max_speed);
    }

    pub fn integrate(&mut self, dt: f64, bounds: &Bounds) {
        let moved = self.position.offset(self.heading.scaled(self.speed * dt));
        self.heading = inward_heading(moved, self.heading, bounds);
        self.position = bounds.clamp(moved);
    }
}

/// Forces any heading component that points out through a touched wall back
/// inward. Components already pointing inward, and the other axis, are kept.
pub fn inward_heading(position: Vec2, heading: Vec2, bounds: &Bounds) -> Vec2 {
    let mut heading = heading;
    if position.x >= bounds.max_x {
        heading.x = -heading.x.abs();
    }
    if position.x <= bounds.min_x {
        heading.x = heading.x.abs();
    }
    if position.y >= bounds.max_y {
        heading.y = -heading.y.abs();
    }
    if position.y <= bounds.min_y {
        heading.y = heading.y.abs();
    }
    heading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds::default()
    }

    #[test]
    fn retarget_draws_within_configured_ranges() {
        let config = TargetConfig::default();
        let mut rng = SeededRng::new(0xC0FFEE);
        let mut target = Target::new(Vec2::ZERO);
        for _ in 0..1_000 {
            target.retarget(&mut rng, &config);
            assert!(target.heading().x.abs() <= 1.0);
            assert!(target.heading().y.abs() <= 0.6);
            assert!((1.0..6.0).contains(&target.speed()));
        }
    }

    #[test]
    fn right_wall_flips_only_x() {
        let mut target = Target {
            position: Vec2::new(51.9, 10.0),
            heading: Vec2::new(0.5, 0.3),
            speed: 4.0,
        };
        target.integrate(0.1, &bounds());

        assert_eq!(target.heading(), Vec2::new(-0.5, 0.3));
        assert_eq!(target.position().x, 52.0);
        assert!((target.position().y - 10.12).abs() < 1e-9);
    }

    #[test]
    fn bottom_wall_flips_only_y() {
        let mut target = Target {
            position: Vec2::new(0.0, -37.95),
            heading: Vec2::new(-0.4, -0.6),
            speed: 1.0,
        };
        target.integrate(0.1, &bounds());

        assert_eq!(target.heading(), Vec2::new(-0.4, 0.6));
        assert_eq!(target.position().y, -38.0);
    }

    #[test]
    fn inward_component_is_left_alone_at_the_wall() {
        let heading = inward_heading(Vec2::new(52.0, 0.0), Vec2::new(-0.7, 0.2), &bounds());
        assert_eq!(heading, Vec2::new(-0.7, 0.2));
    }

    #[test]
    fn long_drift_never_leaves_bounds() {
        let config = TargetConfig::default();
        let bounds = bounds();
        let mut rng = SeededRng::new(42);
        let mut target = Target::new(Vec2::ZERO);
        for step in 0..60_000 {
            if step % 120 == 0 {
                target.retarget(&mut rng, &config);
            }
            target.integrate(1.0 / 60.0, &bounds);
            assert!(bounds.contains(target.position()));
        }
    }
}
