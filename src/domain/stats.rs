use serde::Serialize;

use super::Score;

/// Five fixed bands over the ten-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// score >= 9
    Five,
    /// 7 <= score < 9
    Four,
    /// 5 <= score < 7
    Three,
    /// 3 <= score < 5
    Two,
    /// score < 3
    One,
}

impl Band {
    #[must_use]
    pub const fn of(score: Score) -> Self {
        match score.half_points() {
            18.. => Self::Five,
            14..=17 => Self::Four,
            10..=13 => Self::Three,
            6..=9 => Self::Two,
            _ => Self::One,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub five: u32,
    pub four: u32,
    pub three: u32,
    pub two: u32,
    pub one: u32,
}

impl Distribution {
    fn add(&mut self, band: Band) {
        let slot = match band {
            Band::Five => &mut self.five,
            Band::Four => &mut self.four,
            Band::Three => &mut self.three,
            Band::Two => &mut self.two,
            Band::One => &mut self.one,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub count: u32,
    /// Mean rounded half away from zero to one decimal; 0 when empty.
    pub average: f64,
    pub distribution: Distribution,
}

pub fn summarize<I>(scores: I) -> RatingSummary
where
    I: IntoIterator<Item = Score>,
{
    let mut count: u32 = 0;
    let mut half_points: u64 = 0;
    let mut distribution = Distribution::default();

    for score in scores {
        count += 1;
        half_points += u64::from(score.half_points());
        distribution.add(Band::of(score));
    }

    RatingSummary {
        count,
        average: rounded_mean(half_points, count),
        distribution,
    }
}

/// mean = hp / (2n); tenths = round(5 * hp / n) = floor((10 * hp + n) / 2n)
#[allow(clippy::cast_precision_loss)]
fn rounded_mean(half_points: u64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }

    let n = u64::from(count);
    let tenths = (10 * half_points + n) / (2 * n);
    tenths as f64 / 10.0
}
