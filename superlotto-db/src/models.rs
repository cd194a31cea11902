use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical Super Lotto drawing: 5 front-zone numbers (1-35) and
/// 2 back-zone numbers (1-12). Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draw {
    pub id: i64,
    /// Issue label, e.g. "24001".
    pub draw_number: String,
    pub date: NaiveDate,
    pub front: [u8; 5],
    pub back: [u8; 2],
    pub jackpot_amount: Option<f64>,
    pub winners_count: Option<u32>,
}

impl Draw {
    /// Front-zone numbers in ascending order.
    pub fn sorted_front(&self) -> [u8; 5] {
        let mut f = self.front;
        f.sort_unstable();
        f
    }

    pub fn front_sum(&self) -> u32 {
        self.front.iter().map(|&n| n as u32).sum()
    }

    pub fn odd_count_front(&self) -> usize {
        self.front.iter().filter(|&&n| n % 2 == 1).count()
    }

    pub fn even_count_front(&self) -> usize {
        5 - self.odd_count_front()
    }

    /// True if the sorted front zone contains at least one pair of
    /// numbers differing by exactly 1.
    pub fn has_consecutive_front(&self) -> bool {
        self.sorted_front().windows(2).any(|w| w[1] - w[0] == 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Front,
    Back,
}

impl Zone {
    pub fn size(&self) -> usize {
        match self {
            Zone::Front => 35,
            Zone::Back => 12,
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Zone::Front => 5,
            Zone::Back => 2,
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Zone::Front => &draw.front,
            Zone::Back => &draw.back,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Front => write!(f, "front"),
            Zone::Back => write!(f, "back"),
        }
    }
}

/// Structural invariants of a drawn (or predicted) number set: counts,
/// ranges, distinctness.
pub fn validate_draw(front: &[u8; 5], back: &[u8; 2]) -> Result<()> {
    for &n in front {
        if n < 1 || n > 35 {
            bail!("front-zone number {} out of range (1-35)", n);
        }
    }
    for &n in back {
        if n < 1 || n > 12 {
            bail!("back-zone number {} out of range (1-12)", n);
        }
    }
    for i in 0..front.len() {
        for j in (i + 1)..front.len() {
            if front[i] == front[j] {
                bail!("duplicate front-zone number: {}", front[i]);
            }
        }
    }
    if back[0] == back[1] {
        bail!("duplicate back-zone number: {}", back[0]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(front: [u8; 5], back: [u8; 2]) -> Draw {
        Draw {
            id: 1,
            draw_number: "24001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            front,
            back,
            jackpot_amount: None,
            winners_count: None,
        }
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[1, 2]).is_ok());
        assert!(validate_draw(&[35, 34, 33, 32, 31], &[11, 12]).is_ok());
    }

    #[test]
    fn test_validate_draw_front_out_of_range() {
        assert!(validate_draw(&[0, 2, 3, 4, 5], &[1, 2]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 36], &[1, 2]).is_err());
    }

    #[test]
    fn test_validate_draw_back_out_of_range() {
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[0, 2]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[1, 13]).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate_front() {
        assert!(validate_draw(&[7, 7, 3, 4, 5], &[1, 2]).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate_back() {
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[3, 3]).is_err());
    }

    #[test]
    fn test_zone_size_and_picks() {
        assert_eq!(Zone::Front.size(), 35);
        assert_eq!(Zone::Back.size(), 12);
        assert_eq!(Zone::Front.pick_count(), 5);
        assert_eq!(Zone::Back.pick_count(), 2);
    }

    #[test]
    fn test_zone_numbers_from() {
        let draw = test_draw([1, 2, 3, 4, 5], [6, 7]);
        assert_eq!(Zone::Front.numbers_from(&draw), &[1, 2, 3, 4, 5]);
        assert_eq!(Zone::Back.numbers_from(&draw), &[6, 7]);
    }

    #[test]
    fn test_derived_front_stats() {
        let draw = test_draw([3, 1, 2, 10, 20], [6, 7]);
        assert_eq!(draw.front_sum(), 36);
        assert_eq!(draw.odd_count_front(), 2);
        assert_eq!(draw.even_count_front(), 3);
        assert!(draw.has_consecutive_front());

        let spread = test_draw([1, 5, 10, 20, 30], [6, 7]);
        assert!(!spread.has_consecutive_front());
    }
}
