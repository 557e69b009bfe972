// ═══════════════════════════════════════════════════════════════════════
// Region Safety — signed safety factor for every region of the map
//
// Regions holding castles are seeded (+100 ours, -100 theirs, -50
// contested) and their factors bleed into neighbours breadth-first.
// Each neighbour contributes `factor / neighbour_count` (integer
// division), so the influence fades to zero a few regions out.
// ═══════════════════════════════════════════════════════════════════════

use crate::config::PlannerConfig;
use crate::context::RegionStats;
use conquest_engine::RegionId;
use tracing::trace;

pub const SAFETY_OWN: i32 = 100;
pub const SAFETY_ENEMY: i32 = -100;
pub const SAFETY_CONTESTED: i32 = -50;

/// Seed factor of a region from its raw statistics, or `None` when it
/// must wait for propagation.
pub fn seed_factor(stats: &RegionStats) -> Option<i32> {
    let contested = (stats.friendly_castles > 0 && stats.enemy_castles > 0)
        || (stats.highest_threat > 0.0 && stats.enemy_castles == 0);
    if contested {
        Some(SAFETY_CONTESTED)
    } else if stats.enemy_castles > 0 {
        Some(SAFETY_ENEMY)
    } else if stats.friendly_castles > 0 {
        Some(SAFETY_OWN)
    } else {
        None
    }
}

/// Compute `safety_factor` for every region. `graph[i]` lists the
/// neighbours of region `i`. Returns regions in the order they were
/// processed; each appears at most once.
pub fn evaluate_region_safety(stats: &mut [RegionStats], graph: &[Vec<RegionId>], config: &PlannerConfig) -> Vec<RegionId> {
    let mut queue: Vec<(RegionId, i32)> = Vec::with_capacity(stats.len());
    let mut last_positive = 0;

    for (i, region) in stats.iter_mut().enumerate() {
        match seed_factor(region) {
            Some(factor) => {
                region.safety_factor = factor;
                region.evaluated = true;
                queue.push((RegionId(i as u32), factor));
                if factor > 0 {
                    last_positive += 1;
                }
            }
            None => {
                region.safety_factor = 0;
                region.evaluated = false;
            }
        }
    }
    // Stable: equal factors keep region order
    queue.sort_by(|a, b| b.1.cmp(&a.1));

    let no_neighbours: Vec<RegionId> = Vec::new();
    let mut current = 0;
    let mut batch_start = 0;
    let mut batch_end = last_positive + 1;

    while current < queue.len() {
        let region = queue[current].0;
        let neighbours = graph.get(region.index()).unwrap_or(&no_neighbours);
        let count = neighbours.len() as i32;

        for &neighbour in neighbours {
            let Some(adjacent) = stats.get_mut(neighbour.index()) else { continue };
            if !adjacent.evaluated {
                adjacent.evaluated = true;
                queue.push((neighbour, adjacent.safety_factor));
            }
            if adjacent.safety_factor != 0 {
                queue[current].1 += adjacent.safety_factor / count;
            }
        }
        if count == 0 {
            queue[current].1 = queue[current].1 * config.island_multiplier_num / config.island_multiplier_den;
        }

        if current + 1 == batch_end {
            commit(stats, &queue[batch_start..batch_end]);
            batch_start = batch_end;
            batch_end = queue.len();
        }
        current += 1;
    }

    if batch_start < queue.len() {
        commit(stats, &queue[batch_start..]);
    }

    queue.into_iter().map(|(region, _)| region).collect()
}

fn commit(stats: &mut [RegionStats], batch: &[(RegionId, i32)]) {
    for &(region, factor) in batch {
        if let Some(s) = stats.get_mut(region.index()) {
            s.safety_factor = factor;
            trace!(region = region.0, factor, "region safety");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(friendly: u32, enemy: u32, threat: f64) -> RegionStats {
        RegionStats { friendly_castles: friendly, enemy_castles: enemy, highest_threat: threat, ..RegionStats::default() }
    }

    fn line(n: u32) -> Vec<Vec<RegionId>> {
        (0..n)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 {
                    v.push(RegionId(i - 1));
                }
                if i + 1 < n {
                    v.push(RegionId(i + 1));
                }
                v
            })
            .collect()
    }

    #[test]
    fn seeds_follow_castle_ownership() {
        assert_eq!(seed_factor(&stats(1, 0, -1.0)), Some(100));
        assert_eq!(seed_factor(&stats(0, 2, -1.0)), Some(-100));
        assert_eq!(seed_factor(&stats(1, 1, -1.0)), Some(-50));
        assert_eq!(seed_factor(&stats(1, 0, 300.0)), Some(-50));
        assert_eq!(seed_factor(&stats(0, 1, 300.0)), Some(-100));
        assert_eq!(seed_factor(&stats(0, 0, -1.0)), None);
    }

    #[test]
    fn own_castle_spreads_to_neighbour() {
        let mut regions = vec![stats(1, 0, -1.0), stats(0, 0, -1.0), stats(0, 0, -1.0)];
        let order = evaluate_region_safety(&mut regions, &line(3), &PlannerConfig::default());
        assert_eq!(order, vec![RegionId(0), RegionId(1), RegionId(2)]);
        // Region 1 has two neighbours: 100 / 2
        assert_eq!(regions[1].safety_factor, 50);
        // Region 0 was committed before region 1 had a factor
        assert_eq!(regions[0].safety_factor, 100);
        assert_eq!(regions[2].safety_factor, 50);
        assert!(regions.iter().all(|r| r.evaluated));
    }

    #[test]
    fn island_gets_multiplied() {
        let mut regions = vec![stats(1, 0, -1.0)];
        evaluate_region_safety(&mut regions, &[vec![]], &PlannerConfig::default());
        assert_eq!(regions[0].safety_factor, 150);
    }

    #[test]
    fn unreachable_region_stays_unevaluated() {
        let mut regions = vec![stats(0, 1, -1.0), stats(0, 0, -1.0)];
        evaluate_region_safety(&mut regions, &[vec![], vec![]], &PlannerConfig::default());
        assert_eq!(regions[0].safety_factor, -150);
        assert_eq!(regions[1].safety_factor, 0);
        assert!(!regions[1].evaluated);
    }
}
