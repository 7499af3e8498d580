pub mod heuristics;
pub mod resolver;

pub use heuristics::is_generated;
pub use resolver::{
    css_string, resolve, resolve_optional, resolve_selector, resolve_strategy, to_strategy,
    Locator, LocatorStrategy, ResolvedSelector, SelectorSource, StrategyLocator,
};
