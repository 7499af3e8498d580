use std::collections::HashMap;

use super::types::{WaitCondition, WaitKind, WaitStrategy};

/// Strategies sharing a key collapse into one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    kind: WaitKind,
    condition: Option<WaitCondition>,
}

impl MergeKey {
    fn of(strategy: &WaitStrategy) -> Self {
        // custom waits only merge when they check the same condition
        let condition = match strategy.kind {
            WaitKind::Custom => strategy.condition.clone(),
            _ => None,
        };
        Self {
            kind: strategy.kind,
            condition,
        }
    }
}

/// Pool proposals into the final ordered wait list for a step.
///
/// Exact duplicates are dropped, same-kind entries merged (selector union,
/// maximum timeout), the result sorted by kind priority and every entry given
/// a concrete timeout.
pub fn consolidate(proposals: impl IntoIterator<Item = WaitStrategy>) -> Vec<WaitStrategy> {
    let mut unique: Vec<WaitStrategy> = Vec::new();
    for proposal in proposals {
        if !unique.contains(&proposal) {
            unique.push(proposal);
        }
    }

    let mut merged = merge(unique);
    // stable sort keeps first-proposed order within a priority band
    merged.sort_by_key(|s| s.kind.priority());
    for strategy in &mut merged {
        strategy.timeout_ms = Some(strategy.timeout());
    }
    merged
}

/// Merge strategies of the same kind, keeping first-appearance order
pub fn merge(strategies: Vec<WaitStrategy>) -> Vec<WaitStrategy> {
    let mut merged: Vec<WaitStrategy> = Vec::new();
    let mut index: HashMap<MergeKey, usize> = HashMap::new();

    for strategy in strategies {
        let key = MergeKey::of(&strategy);
        match index.get(&key) {
            Some(&slot) => {
                let target = &mut merged[slot];
                for selector in strategy.selectors {
                    if !target.selectors.contains(&selector) {
                        target.selectors.push(selector);
                    }
                }
                target.timeout_ms = match (target.timeout_ms, strategy.timeout_ms) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
                if target.condition.is_none() {
                    target.condition = strategy.condition;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(strategy);
            }
        }
    }
    merged
}
