//! Synthetic trajectories
//!
//! Deterministic reference/test pairs for tests and demos without recorded data.

use contracts::{Position, Trajectory, TrajectorySample};

/// Path shape of a synthetic trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockPath {
    /// Straight line along +x at `speed` m/s
    Straight { speed: f64 },
    /// Counter-clockwise circle around the origin
    Circle { radius: f64, angular_speed: f64 },
}

/// Synthetic trajectory configuration
#[derive(Debug, Clone)]
pub struct MockTrajectoryConfig {
    /// Role label
    pub name: String,

    /// Path shape
    pub path: MockPath,

    /// Number of samples
    pub samples: usize,

    /// Sampling rate (Hz)
    pub rate_hz: f64,

    /// Timestamp of the first sample (seconds)
    pub start_time: f64,

    /// Constant offset to the left of travel (meters)
    pub lateral_offset: f64,

    /// Amplitude of a sinusoidal lateral wobble (meters)
    pub wobble_amplitude: f64,

    /// Constant height
    pub height: f64,
}

impl Default for MockTrajectoryConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            path: MockPath::Straight { speed: 1.0 },
            samples: 100,
            rate_hz: 10.0,
            start_time: 0.0,
            lateral_offset: 0.0,
            wobble_amplitude: 0.0,
            height: 0.0,
        }
    }
}

/// Synthetic trajectory generator
#[derive(Debug, Clone)]
pub struct MockTrajectory {
    config: MockTrajectoryConfig,
}

impl MockTrajectory {
    pub fn new(config: MockTrajectoryConfig) -> Self {
        Self { config }
    }

    /// Reference along +x
    pub fn straight(name: &str, samples: usize, rate_hz: f64, speed: f64) -> Self {
        Self::new(MockTrajectoryConfig {
            name: name.to_string(),
            path: MockPath::Straight { speed },
            samples,
            rate_hz,
            ..Default::default()
        })
    }

    /// Reference on a circle
    pub fn circle(name: &str, samples: usize, rate_hz: f64, radius: f64, angular_speed: f64) -> Self {
        Self::new(MockTrajectoryConfig {
            name: name.to_string(),
            path: MockPath::Circle {
                radius,
                angular_speed,
            },
            samples,
            rate_hz,
            ..Default::default()
        })
    }

    /// Same path shifted left of travel
    pub fn with_lateral_offset(mut self, offset: f64) -> Self {
        self.config.lateral_offset = offset;
        self
    }

    pub fn with_wobble(mut self, amplitude: f64) -> Self {
        self.config.wobble_amplitude = amplitude;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.config.height = height;
        self
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.config.start_time = start_time;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    pub fn config(&self) -> &MockTrajectoryConfig {
        &self.config
    }

    /// Generate the trajectory
    pub fn generate(&self) -> Trajectory {
        let cfg = &self.config;
        let dt = 1.0 / cfg.rate_hz;

        let samples = (0..cfg.samples)
            .map(|i| {
                let t = i as f64 * dt;
                let offset = cfg.lateral_offset + cfg.wobble_amplitude * (t * 0.5).sin();
                let (x, y) = match cfg.path {
                    MockPath::Straight { speed } => (speed * t, offset),
                    MockPath::Circle {
                        radius,
                        angular_speed,
                    } => {
                        let theta = angular_speed * t;
                        // left of counter-clockwise travel points inward
                        let r = radius - offset;
                        (r * theta.cos(), r * theta.sin())
                    }
                };
                TrajectorySample::new(cfg.start_time + t, Position::new(x, y, cfg.height))
            })
            .collect();

        Trajectory::new(cfg.name.clone(), samples)
    }

    /// Generate CSV text with `sec,nanosec,frame_id,x,y,z` columns
    pub fn to_csv(&self) -> String {
        let mut out = String::from("sec,nanosec,frame_id,x,y,z\n");
        for sample in self.generate().iter() {
            let sec = sample.timestamp.floor();
            let nanosec = ((sample.timestamp - sec) * 1e9).round() as i64;
            let (sec, nanosec) = if nanosec >= 1_000_000_000 {
                (sec as i64 + 1, nanosec - 1_000_000_000)
            } else {
                (sec as i64, nanosec)
            };
            let p = sample.position;
            out.push_str(&format!(
                "{sec},{nanosec},map,{:.9},{:.9},{:.9}\n",
                p.x, p.y, p.z
            ));
        }
        out
    }
}
