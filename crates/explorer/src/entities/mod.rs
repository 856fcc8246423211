//! Core data structures for the mention explorer.

mod filter;
mod mention;
mod page;
mod rule;

pub use filter::{
    normalize_keywords, normalize_sources, source_label, DateRange, FilterSelection,
    ALL_KEYWORD, KNOWN_SOURCES,
};
pub use mention::{AuthorStat, DailyCount, Keyword, KeywordStat, ListTab, Mention, Row, SentimentBreakdown};
pub use page::Page;
pub use rule::{ResultTable, Rule, RuleDraft, RuleId, RuleOutput, RulePatch, RuleResult};
