//! M/M/s queue metrics via Erlang-C.
//!
//! The Erlang-C normaliser `Σ_{k<s} a^k/k! + a^s/s! · s/(s−a)` overflows `f64`
//! for a few hundred stands, so every term is kept as a logarithm and summed
//! with log-sum-exp.

use serde::Serialize;

/// Minutes used for the long-wait tail probability.
pub const LONG_WAIT_MIN: f64 = 15.0;

/// Reported when offered load reaches the server count.
const SATURATED_RHO: f64 = 1.5;
const SATURATED_WQ_MIN: f64 = 45.0;
const MAX_WQ_MIN: f64 = 60.0;

/// Erlang-C results for one arrival window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueueMetrics {
    /// Per-server utilisation `a / s`, or the saturated sentinel.
    pub rho: f64,
    /// Probability an arriving customer waits at all.
    pub p_wait: f64,
    /// Expected wait in queue, minutes.
    pub wq_min: f64,
    /// Probability of waiting longer than [`LONG_WAIT_MIN`].
    pub p_wait_gt_15: f64,
}

impl QueueMetrics {
    const IDLE: QueueMetrics = QueueMetrics {
        rho: 0.0,
        p_wait: 0.0,
        wq_min: 0.0,
        p_wait_gt_15: 0.0,
    };

    const SATURATED: QueueMetrics = QueueMetrics {
        rho: SATURATED_RHO,
        p_wait: 1.0,
        wq_min: SATURATED_WQ_MIN,
        p_wait_gt_15: 1.0,
    };

    pub fn is_saturated(&self) -> bool {
        *self == QueueMetrics::SATURATED
    }
}

/// Running log-sum-exp: a shifted sum rescaled whenever a new maximum arrives.
#[derive(Debug, Clone, Copy)]
struct LogSumExp {
    max: f64,
    sum: f64,
}

impl LogSumExp {
    fn new() -> Self {
        LogSumExp {
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }

    fn push(&mut self, x: f64) {
        if x <= self.max {
            self.sum += (x - self.max).exp();
        } else {
            self.sum = self.sum * (self.max - x).exp() + 1.0;
            self.max = x;
        }
    }

    fn ln(&self) -> f64 {
        if !self.max.is_finite() {
            return self.max;
        }
        self.max + self.sum.ln()
    }
}

/// Erlang-C metrics for `servers` parallel stands each serving
/// `service_rate_per_min` customers a minute, fed `arrivals_per_min`.
///
/// Zero arrivals (or no servers with nothing arriving) give all-zero metrics.
/// Offered load at or above the server count returns the saturated sentinel.
pub fn erlang_c(arrivals_per_min: f64, servers: u32, service_rate_per_min: f64) -> QueueMetrics {
    let lambda = arrivals_per_min.max(0.0);
    if lambda <= 0.0 {
        return QueueMetrics::IDLE;
    }
    let mu = service_rate_per_min.max(1e-9);
    let s = servers.max(1);
    let s_f = f64::from(s);
    let a = lambda / mu;
    if a >= s_f {
        return QueueMetrics::SATURATED;
    }

    // ln(a^k / k!) built incrementally for k = 0..=s.
    let ln_a = a.ln();
    let mut norm = LogSumExp::new();
    let mut ln_term = 0.0;
    norm.push(ln_term);
    for k in 1..s {
        ln_term += ln_a - f64::from(k).ln();
        norm.push(ln_term);
    }
    let ln_tail = ln_term + ln_a - s_f.ln() + (s_f / (s_f - a)).ln();
    norm.push(ln_tail);

    let p_wait = (ln_tail - norm.ln()).exp().clamp(0.0, 1.0);
    let drain = s_f * mu - lambda;
    QueueMetrics {
        rho: a / s_f,
        p_wait,
        wq_min: (p_wait / drain).clamp(0.0, MAX_WQ_MIN),
        p_wait_gt_15: (p_wait * (-drain * LONG_WAIT_MIN).exp()).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_arrivals_are_idle() {
        let m = erlang_c(0.0, 10, 3.0);
        assert_eq!(m, QueueMetrics::IDLE);
        assert_eq!(erlang_c(-4.0, 0, 0.0), QueueMetrics::IDLE);
    }

    #[test]
    fn overload_returns_sentinel() {
        let m = erlang_c(100.0, 10, 10.0);
        assert!(m.is_saturated());
        assert_eq!(m.rho, 1.5);
        assert_eq!(m.p_wait, 1.0);
        assert_eq!(m.wq_min, 45.0);
        assert_eq!(m.p_wait_gt_15, 1.0);
        assert!(erlang_c(500.0, 10, 10.0).is_saturated());
    }

    #[test]
    fn single_server_matches_mm1() {
        let (lambda, mu) = (2.0, 5.0);
        let m = erlang_c(lambda, 1, mu);
        let rho = lambda / mu;
        assert_relative_eq!(m.rho, rho, epsilon = 1e-12);
        assert_relative_eq!(m.p_wait, rho, epsilon = 1e-12);
        assert_relative_eq!(m.wq_min, rho / (mu - lambda), epsilon = 1e-12);
    }

    #[test]
    fn two_servers_match_closed_form() {
        // M/M/2: C = 2ρ² / (1 + ρ), ρ = a/2.
        let m = erlang_c(3.0, 2, 2.0);
        let rho = 0.75;
        assert_relative_eq!(m.p_wait, 2.0 * rho * rho / (1.0 + rho), epsilon = 1e-12);
    }

    #[test]
    fn large_server_counts_stay_finite() {
        let m = erlang_c(2_000.0, 2_000, 1.05);
        assert!(m.p_wait.is_finite());
        assert!((0.0..=1.0).contains(&m.p_wait));
        assert!(m.wq_min.is_finite());
        assert!(m.rho > 0.95 && m.rho < 1.0);
    }

    #[test]
    fn more_servers_shorten_waits() {
        let tight = erlang_c(40.0, 12, 3.5);
        let loose = erlang_c(40.0, 20, 3.5);
        assert!(loose.p_wait < tight.p_wait);
        assert!(loose.wq_min < tight.wq_min);
        assert!(loose.p_wait_gt_15 <= tight.p_wait_gt_15);
    }

    #[test]
    fn running_log_sum_matches_direct_sum() {
        let xs = [-3.0, 2.5, 0.0, 7.25, -40.0, 7.25, 1.0];
        let mut acc = LogSumExp::new();
        for x in xs {
            acc.push(x);
        }
        let direct = xs.iter().map(|x: &f64| x.exp()).sum::<f64>().ln();
        assert_relative_eq!(acc.ln(), direct, epsilon = 1e-12);
        assert_eq!(LogSumExp::new().ln(), f64::NEG_INFINITY);
    }

    #[test]
    fn moderate_server_count_matches_factorial_form() {
        let (lambda, mu, s) = (15.0, 1.0, 20u32);
        let a: f64 = lambda / mu;
        let mut fact = 1.0;
        let mut head = 0.0;
        for k in 0..s {
            if k > 0 {
                fact *= f64::from(k);
            }
            head += a.powi(k as i32) / fact;
        }
        let s_f = f64::from(s);
        let tail = a.powi(s as i32) / (fact * s_f) * s_f / (s_f - a);
        let m = erlang_c(lambda, s, mu);
        assert_relative_eq!(m.p_wait, tail / (head + tail), epsilon = 1e-10);
    }
}
