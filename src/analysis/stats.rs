use serde::Serialize;

pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Equal-width histogram over `[min, max]`. Bins are half-open except the
/// last, which includes `max`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub samples: Vec<f64>,
    pub summary: SummaryStats,
    pub histogram: Histogram,
}

impl Distribution {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        let summary = summarize(&samples);
        let histogram = histogram(&samples, summary.min, summary.max, HISTOGRAM_BINS);
        Distribution {
            samples,
            summary,
            histogram,
        }
    }
}

/// Nearest-rank percentile on sorted data: `sorted[floor(n·q)]`.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
    sorted[idx]
}

pub fn summarize(samples: &[f64]) -> SummaryStats {
    if samples.is_empty() {
        return SummaryStats::default();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    SummaryStats {
        mean,
        std: var.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p5: percentile(&sorted, 0.05),
        p25: percentile(&sorted, 0.25),
        p50: percentile(&sorted, 0.50),
        p75: percentile(&sorted, 0.75),
        p95: percentile(&sorted, 0.95),
    }
}

pub fn histogram(samples: &[f64], min: f64, max: f64, bins: usize) -> Histogram {
    let bins = bins.max(1);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };
    let bin_edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0u32; bins];
    for &v in samples {
        let idx = (((v - min) / width).floor().max(0.0) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { bin_edges, counts }
}
