//! Latency injection: fixed, uniform and log-normal delays.
//!
//! A [`DelaySpec`] is parsed from duration strings at configuration time and
//! turned into a [`DelaySampler`], which precomputes everything the hot path
//! needs. Sampling uses the per-thread RNG.

use crate::error::ConfigError;
use rand::Rng;
use rand_distr::StandardNormal;
use std::time::Duration;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Delay distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum DelaySpec {
    Fixed(Duration),
    /// Uniform over `[min, max)`.
    Uniform { min: Duration, max: Duration },
    /// Log-normal with the given mean and standard deviation, clamped to `max`.
    Normal {
        mean: Duration,
        stddev: Duration,
        max: Duration,
    },
}

impl DelaySpec {
    pub fn fixed(delay: &str) -> Result<Self, ConfigError> {
        Ok(DelaySpec::Fixed(parse_param("delay", delay)?))
    }

    pub fn uniform(min: &str, max: &str) -> Result<Self, ConfigError> {
        Ok(DelaySpec::Uniform {
            min: parse_param("min", min)?,
            max: parse_param("max", max)?,
        })
    }

    pub fn normal(mean: &str, stddev: &str, max: &str) -> Result<Self, ConfigError> {
        Ok(DelaySpec::Normal {
            mean: parse_param("mean", mean)?,
            stddev: parse_param("stddev", stddev)?,
            max: parse_param("max", max)?,
        })
    }

    pub fn sampler(&self) -> DelaySampler {
        let kind = match *self {
            DelaySpec::Fixed(d) => SamplerKind::Fixed(d),
            DelaySpec::Uniform { min, max } => SamplerKind::Uniform {
                min,
                span: max.saturating_sub(min),
            },
            DelaySpec::Normal { mean, stddev, max } => {
                let m = mean.as_secs_f64();
                if m <= 0.0 {
                    SamplerKind::Fixed(Duration::ZERO)
                } else {
                    let d = stddev.as_secs_f64();
                    let a = (1.0 + (d / m).powi(2)).ln();
                    SamplerKind::LogNormal {
                        mu: m.ln() - a / 2.0,
                        sigma: a.sqrt(),
                        max,
                    }
                }
            }
        };
        DelaySampler { kind }
    }
}

/// Precomputed sampler for one [`DelaySpec`].
#[derive(Debug, Clone)]
pub struct DelaySampler {
    kind: SamplerKind,
}

#[derive(Debug, Clone)]
enum SamplerKind {
    Fixed(Duration),
    Uniform { min: Duration, span: Duration },
    LogNormal { mu: f64, sigma: f64, max: Duration },
}

impl DelaySampler {
    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match self.kind {
            SamplerKind::Fixed(d) => d,
            SamplerKind::Uniform { min, span } => {
                let span = span.as_nanos() as u64;
                if span == 0 {
                    min
                } else {
                    min + Duration::from_nanos(rng.gen_range(0..span))
                }
            }
            SamplerKind::LogNormal { mu, sigma, max } => {
                let z: f64 = rng.sample(StandardNormal);
                let secs = (mu + sigma * z).exp();
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}

fn parse_param(parameter: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        parameter,
        value: value.to_string(),
    })
}

/// Parse a duration such as `"300ms"`, `"1.5s"` or `"2m30s"`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `"0"` is
/// accepted. Negative durations are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total = 0.0_f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return None;
        }
        let value: f64 = number.parse().ok()?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => NANOS_PER_SEC,
            "m" => 60.0 * NANOS_PER_SEC,
            "h" => 3_600.0 * NANOS_PER_SEC,
            _ => return None,
        };
        total += value * scale;
        rest = tail;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("100ms"), Some(Duration::from_millis(100)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2m30s"), Some(Duration::from_secs(150)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("250us"), Some(Duration::from_micros(250)));
        assert_eq!(parse_duration("250µs"), Some(Duration::from_micros(250)));
        assert_eq!(parse_duration("42ns"), Some(Duration::from_nanos(42)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "ten", "10", "10 ms", "-5ms", "5d", ".ms", "ms"] {
            assert_eq!(parse_duration(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn test_invalid_duration_names_parameter() {
        match DelaySpec::normal("100ms", "lots", "1s") {
            Err(ConfigError::InvalidDuration { parameter, value }) => {
                assert_eq!(parameter, "stddev");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match DelaySpec::uniform("x", "1s") {
            Err(ConfigError::InvalidDuration { parameter, .. }) => assert_eq!(parameter, "min"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_fixed_delay() {
        let sampler = DelaySpec::fixed("25ms").unwrap().sampler();
        assert_eq!(sampler.sample(), Duration::from_millis(25));
    }

    #[test]
    fn test_uniform_within_bounds() {
        let sampler = DelaySpec::uniform("10ms", "20ms").unwrap().sampler();
        for _ in 0..1000 {
            let d = sampler.sample();
            assert!(d >= Duration::from_millis(10) && d < Duration::from_millis(20));
        }
    }

    #[test]
    fn test_uniform_degenerate_range_returns_min() {
        let sampler = DelaySpec::uniform("30ms", "10ms").unwrap().sampler();
        assert_eq!(sampler.sample(), Duration::from_millis(30));
    }

    #[test]
    fn test_normal_mean_and_clamp() {
        let sampler = DelaySpec::normal("100ms", "20ms", "300ms").unwrap().sampler();
        let mut rng = StdRng::seed_from_u64(7);
        let cap = Duration::from_millis(300);
        let n = 100_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let d = sampler.sample_with(&mut rng);
            assert!(d <= cap);
            sum += d.as_secs_f64();
        }
        let mean_ms = sum / n as f64 * 1000.0;
        assert!((mean_ms - 100.0).abs() < 1.0, "empirical mean {mean_ms}ms");
    }

    #[test]
    fn test_normal_is_reproducible_with_seeded_rng() {
        let sampler = DelaySpec::normal("50ms", "10ms", "1s").unwrap().sampler();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..32)
                .map(|_| sampler.sample_with(&mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(11), draw(11));
        assert_ne!(draw(11), draw(12));
    }

    #[test]
    fn test_normal_clamps_heavy_tail() {
        let sampler = DelaySpec::normal("100ms", "500ms", "150ms").unwrap().sampler();
        let mut rng = StdRng::seed_from_u64(11);
        let cap = Duration::from_millis(150);
        assert!((0..10_000).all(|_| sampler.sample_with(&mut rng) <= cap));
    }

    #[test]
    fn test_normal_zero_stddev_is_constant() {
        let sampler = DelaySpec::normal("40ms", "0s", "1s").unwrap().sampler();
        let d = sampler.sample();
        assert!((d.as_secs_f64() - 0.040).abs() < 1e-9);
    }
}
